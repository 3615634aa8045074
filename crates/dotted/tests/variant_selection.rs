//! Variant-suffixed key selection against ambient context.

use dotted::{Dimension, Dotted, Value, VariantKey, doc};

// =============================================================================
// Language Selection
// =============================================================================

#[test]
fn language_context_picks_the_matching_variant() {
    let engine = Dotted::builder()
        .schema(doc!({
            "profile": {
                "lang": "es",
                ".bio": "English bio",
                ".bio:es": "Biografía"
            }
        }))
        .build();
    assert_eq!(engine.get("profile.bio").unwrap(), Value::from("Biografía"));
}

#[test]
fn plain_variants_select_without_expressions() {
    let engine = Dotted::builder()
        .schema(doc!({ "lang": "fr", "greeting": "Hello", "greeting:fr": "Bonjour" }))
        .build();
    assert_eq!(engine.get("greeting").unwrap(), Value::from("Bonjour"));
}

#[test]
fn mismatched_dimensions_disqualify() {
    let engine = Dotted::builder()
        .schema(doc!({ "lang": "de", "msg": "hi", "msg:fr": "salut" }))
        .build();
    assert_eq!(engine.get("msg").unwrap(), Value::from("hi"));
}

#[test]
fn absent_dimensions_disqualify() {
    // No ambient formality at all, so the suffixed key cannot win.
    let engine = Dotted::builder()
        .schema(doc!({ "note": "base", "note:formal": "polite note" }))
        .build();
    assert_eq!(engine.get("note").unwrap(), Value::from("base"));
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn more_specific_wins_at_equal_context() {
    let engine = Dotted::builder()
        .schema(doc!({
            "lang": "es",
            "gender": "f",
            "title": "Dev",
            "title:es": "Desarrollador",
            "title:es:f": "Desarrolladora"
        }))
        .build();
    assert_eq!(engine.get("title").unwrap(), Value::from("Desarrolladora"));
}

#[test]
fn gender_outweighs_formality() {
    let engine = Dotted::builder()
        .schema(doc!({
            "gender": "f",
            "form": "formal",
            "name:f": "her name",
            "name:formal": "formal name"
        }))
        .build();
    assert_eq!(engine.get("name").unwrap(), Value::from("her name"));
}

#[test]
fn exact_score_ties_break_lexicographically() {
    let engine = Dotted::builder()
        .schema(doc!({
            "aa": true,
            "bb": true,
            "cc": true,
            "dd": true,
            "k:aa:bb": "first",
            "k:cc:dd": "second"
        }))
        .build();
    assert_eq!(engine.get("k").unwrap(), Value::from("first"));
}

#[test]
fn custom_dimensions_match_self_naming_properties() {
    let engine = Dotted::builder()
        .schema(doc!({ "urgent": true, "alert": "calm", "alert:urgent": "URGENT" }))
        .build();
    assert_eq!(engine.get("alert").unwrap(), Value::from("URGENT"));

    let off = Dotted::builder()
        .schema(doc!({ "urgent": false, "alert": "calm", "alert:urgent": "URGENT" }))
        .build();
    assert_eq!(off.get("alert").unwrap(), Value::from("calm"));
}

#[test]
fn nearest_scope_dimension_wins() {
    let engine = Dotted::builder()
        .schema(doc!({
            "lang": "en",
            "sec": { "lang": "ja", "word": "hello", "word:ja": "こんにちは" }
        }))
        .build();
    assert_eq!(engine.get("sec.word").unwrap(), Value::from("こんにちは"));
    // Outside the section the root language applies.
    assert_eq!(engine.get("lang").unwrap(), Value::from("en"));
}

// =============================================================================
// Requested Suffixes
// =============================================================================

#[test]
fn requested_suffix_overrides_ambient() {
    let engine = Dotted::builder()
        .schema(doc!({ "lang": "es", ".msg": "hola", ".msg:en": "hello" }))
        .build();
    assert_eq!(engine.get("msg").unwrap(), Value::from("hola"));
    assert_eq!(engine.get("msg:en").unwrap(), Value::from("hello"));

    // The materialized twin keeps the variant suffix.
    assert_eq!(engine.document().get("msg:en"), Some(&Value::from("hello")));
}

#[test]
fn requested_suffix_works_on_explicit_expression_reads() {
    let engine = Dotted::builder()
        .schema(doc!({ ".bio": "default", ".bio:es": "en español" }))
        .build();
    assert_eq!(engine.get(".bio:es").unwrap(), Value::from("en español"));
    assert_eq!(engine.get(".bio").unwrap(), Value::from("default"));
}

#[test]
fn suffixed_reads_of_missing_bases_are_null() {
    let engine = Dotted::builder().schema(doc!({ "a": 1 })).build();
    assert_eq!(engine.get("ghost:es").unwrap(), Value::Null);
}

// =============================================================================
// Variants with Expressions
// =============================================================================

#[test]
fn expression_variants_evaluate_the_chosen_candidate() {
    let engine = Dotted::builder()
        .schema(doc!({
            "lang": "es",
            "name": "Ana",
            ".welcome": "Welcome, ${name}",
            ".welcome:es": "Bienvenida, ${name}"
        }))
        .build();
    assert_eq!(engine.get("welcome").unwrap(), Value::from("Bienvenida, Ana"));

    // Only the selected candidate materialized.
    let snapshot = engine.document();
    assert_eq!(snapshot.get("welcome:es"), Some(&Value::from("Bienvenida, Ana")));
    assert!(snapshot.get("welcome").is_none());
}

#[test]
fn plain_and_expression_candidates_compete() {
    // The plain suffixed key outscores the expression base once ambient
    // language is Spanish.
    let engine = Dotted::builder()
        .schema(doc!({ "lang": "es", ".label": "computed", "label:es": "etiqueta" }))
        .build();
    assert_eq!(engine.get("label").unwrap(), Value::from("etiqueta"));
}

// =============================================================================
// Key Parsing and Canonical Form
// =============================================================================

#[test]
fn variant_keys_serialize_canonically() {
    // Language before gender before formality before customs, regardless
    // of source order.
    let key = VariantKey::parse("greeting:formal:es");
    assert_eq!(key.base(), "greeting");
    assert_eq!(key.to_string(), "greeting:es:formal");

    let key = VariantKey::parse("k:pirate:f:es");
    assert_eq!(key.to_string(), "k:es:f:pirate");
    assert_eq!(VariantKey::parse(&key.to_string()).to_string(), "k:es:f:pirate");
}

#[test]
fn token_order_does_not_affect_equality() {
    assert_eq!(VariantKey::parse("k:es:f"), VariantKey::parse("k:f:es"));
    assert_ne!(VariantKey::parse("k:es"), VariantKey::parse("k:fr"));
}

#[test]
fn bases_keep_dots_and_repeated_dimensions_keep_the_last_token() {
    let key = VariantKey::parse(".bio:es");
    assert_eq!(key.base(), ".bio");
    assert!(!key.is_plain());

    let key = VariantKey::parse("k:en:es");
    assert_eq!(
        key.dimensions().get(&Dimension::Lang).map(String::as_str),
        Some("es")
    );
}
