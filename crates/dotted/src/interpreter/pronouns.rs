//! Pronoun tables.
//!
//! `:subject`-style placeholders resolve against the ambient `gender` and
//! `lang` dimensions. Lookup never fails: unknown languages fall back to
//! English, unknown genders fall back to the neutral row, and languages
//! without a neutral row fall back to the English neutral row.

/// The grammatical role a pronoun placeholder requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PronounForm {
    Subject,
    Object,
    Possessive,
    Reflexive,
}

impl PronounForm {
    /// Parse a placeholder name, without its leading colon.
    pub fn parse(name: &str) -> Option<PronounForm> {
        match name {
            "subject" => Some(PronounForm::Subject),
            "object" => Some(PronounForm::Object),
            "possessive" => Some(PronounForm::Possessive),
            "reflexive" => Some(PronounForm::Reflexive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PronounForm::Subject => "subject",
            PronounForm::Object => "object",
            PronounForm::Possessive => "possessive",
            PronounForm::Reflexive => "reflexive",
        }
    }
}

/// One gender's pronouns in subject, object, possessive, reflexive order.
type PronounRow = (&'static str, [&'static str; 4]);

/// Pronoun rows for a language, keyed by gender token.
fn table(lang: &str) -> Option<&'static [PronounRow]> {
    match lang {
        "en" => Some(&[
            ("m", ["he", "him", "his", "himself"]),
            ("f", ["she", "her", "her", "herself"]),
            ("x", ["they", "them", "their", "themselves"]),
        ]),
        "es" => Some(&[
            ("m", ["él", "lo", "su", "se"]),
            ("f", ["ella", "la", "su", "se"]),
            ("x", ["elle", "le", "su", "se"]),
        ]),
        "fr" => Some(&[
            ("m", ["il", "le", "son", "se"]),
            ("f", ["elle", "la", "sa", "se"]),
            ("x", ["iel", "iel", "leur", "se"]),
        ]),
        // German has no conventional neutral row; lookups for "x" fall back
        // to the English neutral row.
        "de" => Some(&[
            ("m", ["er", "ihn", "sein", "sich"]),
            ("f", ["sie", "sie", "ihr", "sich"]),
        ]),
        "pt" => Some(&[
            ("m", ["ele", "o", "seu", "se"]),
            ("f", ["ela", "a", "sua", "se"]),
            ("x", ["elu", "elu", "delu", "se"]),
        ]),
        _ => None,
    }
}

const ENGLISH_NEUTRAL: [&str; 4] = ["they", "them", "their", "themselves"];

/// Resolve a pronoun for a gender and language. Total: every combination
/// produces some pronoun.
pub fn resolve_pronoun(form: PronounForm, gender: &str, lang: &str) -> &'static str {
    // Regional tags such as pt-BR use their primary subtag's table.
    let primary = lang.split('-').next().unwrap_or(lang);
    let rows = table(primary).or_else(|| table("en"));
    let row = rows.and_then(|rows| {
        rows.iter()
            .find(|(g, _)| *g == gender)
            .or_else(|| rows.iter().find(|(g, _)| *g == "x"))
            .map(|(_, forms)| forms)
    });
    let forms = row.unwrap_or(&ENGLISH_NEUTRAL);
    let index = match form {
        PronounForm::Subject => 0,
        PronounForm::Object => 1,
        PronounForm::Possessive => 2,
        PronounForm::Reflexive => 3,
    };
    forms[index]
}
