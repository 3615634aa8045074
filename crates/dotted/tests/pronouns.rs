//! Pronoun tables and `:form` placeholders in templates.

use dotted::{Dotted, EvalError, PronounForm, Value, doc, resolve_pronoun};

// =============================================================================
// Table Lookups
// =============================================================================

#[test]
fn english_rows() {
    assert_eq!(resolve_pronoun(PronounForm::Subject, "f", "en"), "she");
    assert_eq!(resolve_pronoun(PronounForm::Object, "m", "en"), "him");
    assert_eq!(resolve_pronoun(PronounForm::Possessive, "x", "en"), "their");
    assert_eq!(resolve_pronoun(PronounForm::Reflexive, "f", "en"), "herself");
}

#[test]
fn other_language_rows() {
    assert_eq!(resolve_pronoun(PronounForm::Subject, "f", "es"), "ella");
    assert_eq!(resolve_pronoun(PronounForm::Subject, "m", "fr"), "il");
    assert_eq!(resolve_pronoun(PronounForm::Object, "f", "pt"), "a");
    assert_eq!(resolve_pronoun(PronounForm::Subject, "m", "de"), "er");
}

#[test]
fn missing_rows_fall_back_to_english_neutral() {
    // German has no neutral row of its own.
    assert_eq!(resolve_pronoun(PronounForm::Subject, "x", "de"), "they");
    assert_eq!(resolve_pronoun(PronounForm::Reflexive, "x", "de"), "themselves");
}

#[test]
fn unknown_languages_use_english() {
    assert_eq!(resolve_pronoun(PronounForm::Subject, "f", "zz"), "she");
    assert_eq!(resolve_pronoun(PronounForm::Subject, "x", "zz"), "they");
}

#[test]
fn regional_tags_use_the_primary_subtag() {
    assert_eq!(resolve_pronoun(PronounForm::Subject, "m", "pt-BR"), "ele");
    assert_eq!(resolve_pronoun(PronounForm::Subject, "f", "en-GB"), "she");
}

#[test]
fn unknown_genders_use_the_neutral_row() {
    assert_eq!(resolve_pronoun(PronounForm::Subject, "robot", "en"), "they");
    assert_eq!(resolve_pronoun(PronounForm::Subject, "robot", "es"), "elle");
}

#[test]
fn form_names_parse() {
    assert_eq!(PronounForm::parse("subject"), Some(PronounForm::Subject));
    assert_eq!(PronounForm::parse("object"), Some(PronounForm::Object));
    assert_eq!(
        PronounForm::parse("possessive"),
        Some(PronounForm::Possessive)
    );
    assert_eq!(PronounForm::parse("reflexive"), Some(PronounForm::Reflexive));
    assert_eq!(PronounForm::parse("selfish"), None);
    assert_eq!(PronounForm::Object.as_str(), "object");
}

// =============================================================================
// Placeholders in Templates
// =============================================================================

#[test]
fn placeholders_read_ambient_gender_and_language() {
    let engine = Dotted::builder()
        .schema(doc!({
            "lang": "es",
            "author": {
                "gender": "f",
                ".intro": "${:subject} escribe"
            }
        }))
        .build();
    assert_eq!(
        engine.get("author.intro").unwrap(),
        Value::from("ella escribe")
    );
}

#[test]
fn placeholders_default_to_neutral_english() {
    let engine = Dotted::builder()
        .schema(doc!({ ".p": "${:subject}/${:possessive}" }))
        .build();
    assert_eq!(engine.get("p").unwrap(), Value::from("they/their"));
}

#[test]
fn nearest_gender_wins() {
    let engine = Dotted::builder()
        .schema(doc!({
            "gender": "m",
            "team": { "gender": "f", ".who": "${:subject}" },
            ".who": "${:subject}"
        }))
        .build();
    assert_eq!(engine.get("team.who").unwrap(), Value::from("she"));
    assert_eq!(engine.get("who").unwrap(), Value::from("he"));
}

#[test]
fn all_four_forms_interpolate() {
    let engine = Dotted::builder()
        .schema(doc!({
            "gender": "f",
            ".bio": "${:subject} said ${:object} file is ${:possessive}, by ${:reflexive}"
        }))
        .build();
    assert_eq!(
        engine.get("bio").unwrap(),
        Value::from("she said her file is her, by herself")
    );
}

#[test]
fn unknown_forms_error() {
    let engine = Dotted::builder()
        .schema(doc!({ ".p": "${:selfish}" }))
        .build();
    let err = engine.get("p").unwrap_err();
    assert!(
        matches!(err, EvalError::Expression { .. }),
        "expected Expression, got: {err:?}"
    );
    assert!(err.to_string().contains("unknown pronoun form ':selfish'"));
}
