//! Scoped views over a shared engine.

use dotted::{Dotted, Fallback, GetOptions, Value, doc};

fn team_schema() -> Value {
    doc!({
        "company": "Acme",
        "lang": "en",
        "users": {
            "zoe": {
                "name": "Zoe",
                ".greet": "Hi, ${name}!",
                ".bio": "the bio",
                ".bio:es": "la biografía",
                ".card": "${company} / ${name}"
            }
        }
    })
}

// =============================================================================
// Relative Reads and Writes
// =============================================================================

#[test]
fn reads_are_relative_to_the_prefix() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");
    assert_eq!(zoe.get("name").unwrap(), Value::from("Zoe"));
    assert_eq!(zoe.get("greet").unwrap(), Value::from("Hi, Zoe!"));
}

#[test]
fn writes_land_under_the_prefix() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");
    zoe.set("mood", "happy").unwrap();

    assert_eq!(engine.get("users.zoe.mood").unwrap(), Value::from("happy"));
    assert_eq!(engine.get("mood").unwrap(), Value::Null);
}

#[test]
fn the_empty_path_addresses_the_prefix_node() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");

    let node = zoe.get("").unwrap();
    assert_eq!(node.get("name"), Some(&Value::from("Zoe")));

    let keys = zoe.keys("");
    assert!(keys.contains(&".greet".to_string()));
    assert!(keys.contains(&"name".to_string()));
}

#[test]
fn has_and_delete_are_relative() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");

    assert!(zoe.has("name"));
    assert!(!zoe.has("ghost"));

    zoe.delete("name").unwrap();
    assert!(!zoe.has("name"));
    assert!(engine.has("users.zoe..greet"));
}

// =============================================================================
// Context and References Through the Prefix
// =============================================================================

#[test]
fn ambient_context_reaches_into_views() {
    let engine = Dotted::builder().schema(team_schema()).build();
    engine.set("lang", "es").unwrap();

    let zoe = engine.scope("users.zoe");
    assert_eq!(zoe.get("bio").unwrap(), Value::from("la biografía"));
}

#[test]
fn references_still_walk_toward_the_root() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");
    assert_eq!(zoe.get("card").unwrap(), Value::from("Acme / Zoe"));
}

// =============================================================================
// Nesting and Identity
// =============================================================================

#[test]
fn scopes_nest() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let users = engine.scope("users");
    let zoe = users.scope("zoe");

    assert_eq!(zoe.root(), "users.zoe");
    assert_eq!(zoe.get("name").unwrap(), Value::from("Zoe"));
}

#[test]
fn views_share_one_engine() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");
    let again = engine.scope("users.zoe");

    zoe.set("name", "Chloe").unwrap();
    assert_eq!(again.get("name").unwrap(), Value::from("Chloe"));
    assert_eq!(again.get("greet").unwrap(), Value::from("Hi, Chloe!"));
}

#[test]
fn options_pass_through_views() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let zoe = engine.scope("users.zoe");

    let options = GetOptions::builder()
        .fallback(Fallback::value("n/a"))
        .build();
    assert_eq!(zoe.get_with("ghost", options).unwrap(), Value::from("n/a"));
}

#[test]
fn scoping_an_absent_path_reads_null() {
    let engine = Dotted::builder().schema(team_schema()).build();
    let nobody = engine.scope("users.nobody");
    assert_eq!(nobody.get("name").unwrap(), Value::Null);
    assert!(nobody.keys("").is_empty());
}
