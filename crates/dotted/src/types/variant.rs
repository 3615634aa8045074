use std::collections::BTreeMap;
use std::fmt;

/// A dimension along which a key can vary.
///
/// The derived ordering (language before gender before formality before
/// custom) is the canonical order used when a [`VariantKey`] serializes, so
/// `greeting:formal:es` and `greeting:es:formal` print identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    /// A language tag such as `en` or `pt-BR`.
    Lang,
    /// A grammatical gender: `m`, `f`, or `x`.
    Gender,
    /// A formality level such as `casual` or `formal`.
    Form,
    /// Any other token. The token names both the dimension and its value.
    Custom(String),
}

/// Formality tokens recognized for the `Form` dimension.
pub const FORMALITY_LEVELS: &[&str] =
    &["casual", "informal", "neutral", "polite", "formal", "honorific"];

/// Gender tokens recognized for the `Gender` dimension.
pub const GENDER_TOKENS: &[&str] = &["m", "f", "x"];

impl Dimension {
    /// Classify a variant token into its dimension.
    pub fn classify(token: &str) -> Dimension {
        if GENDER_TOKENS.contains(&token) {
            Dimension::Gender
        } else if FORMALITY_LEVELS.contains(&token) {
            Dimension::Form
        } else if is_lang_token(token) {
            Dimension::Lang
        } else {
            Dimension::Custom(token.to_string())
        }
    }

    /// Score contribution of a matched token in this dimension.
    pub fn weight(&self) -> u32 {
        match self {
            Dimension::Lang => 1000,
            Dimension::Gender => 100,
            Dimension::Form => 50,
            Dimension::Custom(_) => 10,
        }
    }

    /// The document property consulted when discovering ambient context for
    /// this dimension.
    pub fn property_name(&self) -> &str {
        match self {
            Dimension::Lang => "lang",
            Dimension::Gender => "gender",
            Dimension::Form => "form",
            Dimension::Custom(name) => name,
        }
    }
}

/// Whether a token looks like a BCP 47-style language tag: a two or three
/// letter lowercase primary subtag, optionally followed by `-` and a two to
/// four character alphanumeric subtag.
fn is_lang_token(token: &str) -> bool {
    let (primary, rest) = match token.split_once('-') {
        Some((primary, rest)) => (primary, Some(rest)),
        None => (token, None),
    };
    let primary_ok = (2..=3).contains(&primary.len())
        && primary.chars().all(|ch| ch.is_ascii_lowercase());
    let rest_ok = match rest {
        None => true,
        Some(subtag) => {
            (2..=4).contains(&subtag.len()) && subtag.chars().all(|ch| ch.is_ascii_alphanumeric())
        }
    };
    primary_ok && rest_ok
}

/// A key name split into its base and variant dimensions.
///
/// Keys may carry colon-separated variant tokens, as in `greeting:es:formal`.
/// The base keeps any leading dots, so `.bio:es` parses to base `.bio` with
/// language `es`. Two keys are equal when their bases match and they carry
/// the same dimension set, regardless of token order in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantKey {
    base: String,
    dimensions: BTreeMap<Dimension, String>,
}

impl VariantKey {
    /// Parse a key name. Empty variant tokens are ignored, and a repeated
    /// dimension keeps the last token.
    pub fn parse(key: &str) -> Self {
        let mut parts = key.split(':');
        let base = parts.next().unwrap_or_default().to_string();
        let mut dimensions = BTreeMap::new();
        for token in parts {
            if token.is_empty() {
                continue;
            }
            dimensions.insert(Dimension::classify(token), token.to_string());
        }
        VariantKey { base, dimensions }
    }

    /// The key name without variant tokens. Retains any leading dots.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The variant dimensions this key carries, in canonical order.
    pub fn dimensions(&self) -> &BTreeMap<Dimension, String> {
        &self.dimensions
    }

    /// Whether this key carries no variant tokens.
    pub fn is_plain(&self) -> bool {
        self.dimensions.is_empty()
    }
}

impl fmt::Display for VariantKey {
    /// Canonical serialization: base, then tokens in dimension order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for token in self.dimensions.values() {
            write!(f, ":{token}")?;
        }
        Ok(())
    }
}

impl From<&str> for VariantKey {
    fn from(key: &str) -> Self {
        VariantKey::parse(key)
    }
}
