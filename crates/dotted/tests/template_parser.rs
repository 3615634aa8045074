//! Source classification, template segmentation, and the expression
//! grammar.

use dotted::ParseError;
use dotted::parser::{
    BinaryOp, Expr, Parsed, Reference, Segment, SourceKind, StrPart, classify, parse_expression,
    parse_source, parse_template,
};

// =============================================================================
// Classification
// =============================================================================

#[test]
fn classifies_by_shape() {
    assert_eq!(classify("hello there"), SourceKind::Literal);
    assert_eq!(classify("v ${x}"), SourceKind::Template);
    assert_eq!(classify("[1, 2]"), SourceKind::Structured);
    assert_eq!(classify("  {a: 1}"), SourceKind::Structured);
    assert_eq!(classify("'quoted'"), SourceKind::Structured);
    assert_eq!(classify("\"quoted\""), SourceKind::Structured);
    assert_eq!(classify("fetchUser(1)"), SourceKind::Call);
    assert_eq!(classify("f_1(x)"), SourceKind::Call);
}

#[test]
fn call_syntax_needs_a_touching_identifier() {
    assert_eq!(classify("do (x)"), SourceKind::Literal);
    assert_eq!(classify("(just parens)"), SourceKind::Literal);
}

#[test]
fn bare_dollars_are_literal() {
    assert_eq!(classify("about $40"), SourceKind::Literal);
    assert_eq!(classify("$x and $y"), SourceKind::Literal);
}

// =============================================================================
// parse_source
// =============================================================================

#[test]
fn sources_parse_to_their_evaluatable_form() {
    assert_eq!(
        parse_source("plain text").unwrap(),
        Parsed::Literal("plain text".to_string())
    );
    assert!(matches!(
        parse_source("v: ${x}").unwrap(),
        Parsed::Template(_)
    ));
    assert!(matches!(
        parse_source("[1, 2]").unwrap(),
        Parsed::Expression(Expr::List(_))
    ));
    assert!(matches!(
        parse_source("whoami()").unwrap(),
        Parsed::Expression(Expr::Call { .. })
    ));
}

#[test]
fn whole_marker_sources_are_computed() {
    // A template that is one expression end to end yields the typed value.
    assert!(matches!(
        parse_source("${1 + 1}").unwrap(),
        Parsed::Expression(Expr::Binary { .. })
    ));
    assert!(matches!(
        parse_source("  ${1 + 1}  ").unwrap(),
        Parsed::Expression(Expr::Binary { .. })
    ));
    // Leading text forces template evaluation.
    assert!(matches!(
        parse_source("= ${1 + 1}").unwrap(),
        Parsed::Template(_)
    ));
}

// =============================================================================
// Template Segments
// =============================================================================

#[test]
fn templates_split_into_segments() {
    let template = parse_template("Hello, ${name}!").unwrap();
    assert_eq!(template.segments.len(), 3);
    assert_eq!(
        template.segments[0],
        Segment::Literal("Hello, ".to_string())
    );
    assert!(matches!(
        &template.segments[1],
        Segment::Interpolation(Expr::Reference(_))
    ));
    assert_eq!(template.segments[2], Segment::Literal("!".to_string()));
}

#[test]
fn dollar_escapes_and_bare_dollars() {
    let template = parse_template("cost: $$${n}").unwrap();
    assert_eq!(template.segments.len(), 2);
    assert_eq!(
        template.segments[0],
        Segment::Literal("cost: $".to_string())
    );

    let template = parse_template("$100 and $x").unwrap();
    assert_eq!(
        template.segments,
        vec![Segment::Literal("$100 and $x".to_string())]
    );
}

// =============================================================================
// Expression Grammar
// =============================================================================

#[test]
fn precedence_binds_multiplication_tighter() {
    let expr = parse_expression("1 + 2 * 3").unwrap();
    assert_eq!(
        expr,
        Expr::binary(
            BinaryOp::Add,
            Expr::Int(1),
            Expr::binary(BinaryOp::Mul, Expr::Int(2), Expr::Int(3)),
        )
    );
}

#[test]
fn keyword_literals() {
    assert_eq!(parse_expression("null").unwrap(), Expr::Null);
    assert_eq!(parse_expression("true").unwrap(), Expr::Bool(true));
    assert_eq!(parse_expression("false").unwrap(), Expr::Bool(false));
    // Keywords only match the whole identifier.
    assert_eq!(
        parse_expression("nullx").unwrap(),
        Expr::Reference(Reference {
            dots: 0,
            segments: vec!["nullx".to_string()],
        })
    );
}

#[test]
fn number_forms() {
    assert_eq!(parse_expression("42").unwrap(), Expr::Int(42));
    assert_eq!(parse_expression("3.5").unwrap(), Expr::Float(3.5));
    assert_eq!(parse_expression("1e3").unwrap(), Expr::Float(1000.0));
    // Beyond i64 range, integers widen to float.
    assert!(matches!(
        parse_expression("99999999999999999999").unwrap(),
        Expr::Float(_)
    ));
}

#[test]
fn string_escapes_unescape_at_parse_time() {
    assert_eq!(
        parse_expression(r"'a\nb'").unwrap(),
        Expr::Str(vec![StrPart::Text("a\nb".to_string())])
    );
    assert_eq!(
        parse_expression(r"'it\'s'").unwrap(),
        Expr::Str(vec![StrPart::Text("it's".to_string())])
    );
}

#[test]
fn strings_may_embed_markers() {
    let expr = parse_expression("'Hi ${name}'").unwrap();
    let Expr::Str(parts) = expr else {
        panic!("expected Str, got something else");
    };
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], StrPart::Text("Hi ".to_string()));
    assert!(matches!(&parts[1], StrPart::Interpolation(_)));
}

#[test]
fn collection_literals() {
    assert_eq!(
        parse_expression("[1, 2,]").unwrap(),
        Expr::List(vec![Expr::Int(1), Expr::Int(2)])
    );
    assert_eq!(
        parse_expression("{a: 1, 'b c': 2}").unwrap(),
        Expr::Map(vec![
            ("a".to_string(), Expr::Int(1)),
            ("b c".to_string(), Expr::Int(2)),
        ])
    );
}

#[test]
fn reference_tokens_count_leading_dots() {
    assert_eq!(
        parse_expression("a.b.c").unwrap(),
        Expr::Reference(Reference {
            dots: 0,
            segments: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        })
    );
    assert_eq!(
        parse_expression("..up.name").unwrap(),
        Expr::Reference(Reference {
            dots: 2,
            segments: vec!["up".to_string(), "name".to_string()],
        })
    );
    assert_eq!(
        parse_expression("items.0").unwrap(),
        Expr::Reference(Reference {
            dots: 0,
            segments: vec!["items".to_string(), "0".to_string()],
        })
    );
}

#[test]
fn calls_pronouns_and_postfix() {
    assert_eq!(
        parse_expression("f(1, x)").unwrap(),
        Expr::Call {
            name: "f".to_string(),
            args: vec![
                Expr::Int(1),
                Expr::Reference(Reference {
                    dots: 0,
                    segments: vec!["x".to_string()],
                }),
            ],
        }
    );
    assert_eq!(
        parse_expression(":subject").unwrap(),
        Expr::Pronoun("subject".to_string())
    );
    assert!(matches!(
        parse_expression("profile().name").unwrap(),
        Expr::Member { .. }
    ));
    assert!(matches!(
        parse_expression("items[0]").unwrap(),
        Expr::Index { .. }
    ));
}

#[test]
fn ternaries_parse_right_associative() {
    let expr = parse_expression("a ? 1 : b ? 2 : 3").unwrap();
    let Expr::Ternary { else_branch, .. } = expr else {
        panic!("expected Ternary");
    };
    assert!(matches!(*else_branch, Expr::Ternary { .. }));
}

// =============================================================================
// Parse Errors
// =============================================================================

#[test]
fn trailing_input_reports_position() {
    let err = parse_expression("1 +").unwrap_err();
    assert!(
        matches!(
            err,
            ParseError::Syntax {
                line: 1,
                column: 3,
                ..
            }
        ),
        "expected Syntax at 1:3, got: {err:?}"
    );
    assert!(err.to_string().contains("unexpected character"));
}

#[test]
fn empty_input_is_unexpected_eof() {
    let err = parse_expression("").unwrap_err();
    assert!(
        matches!(err, ParseError::UnexpectedEof { .. }),
        "expected UnexpectedEof, got: {err:?}"
    );
}

#[test]
fn unterminated_markers_and_strings() {
    let err = parse_template("${1").unwrap_err();
    assert!(
        matches!(err, ParseError::UnexpectedEof { .. }),
        "expected UnexpectedEof, got: {err:?}"
    );

    let err = parse_expression("'abc").unwrap_err();
    assert!(
        matches!(err, ParseError::UnexpectedEof { .. }),
        "expected UnexpectedEof, got: {err:?}"
    );
}

#[test]
fn error_positions_count_lines() {
    let err = parse_template("line one\n${ %%% }").unwrap_err();
    assert!(
        matches!(err, ParseError::Syntax { line: 2, .. }),
        "expected Syntax on line 2, got: {err:?}"
    );
}
