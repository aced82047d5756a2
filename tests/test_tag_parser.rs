use tag_filters::expression::{
    FilterInvocation, InvocationForm, NOMATCH_SENTINEL, parse_args, split_filters,
};
use tag_filters::{TagExpression, Value, parse_tag_expression};

#[test]
fn test_plain_and_dotted_paths() {
    assert_eq!(parse_tag_expression("name").path, vec!["name"]);
    assert_eq!(parse_tag_expression("a.b.c").path, vec!["a", "b", "c"]);
    assert_eq!(
        parse_tag_expression(".loop.item").path,
        vec![".loop.item"],
        "command references are not split"
    );
}

#[test]
fn test_default_and_chain_ordering() {
    let before = parse_tag_expression("x:dflt|upper");
    assert_eq!(before.default_text.as_deref(), Some("dflt"));
    assert_eq!(before.filter_chain.as_deref(), Some("upper"));
    assert!(before.apply_filters_to_default);

    let after = parse_tag_expression("x|upper:dflt");
    assert_eq!(after.default_text.as_deref(), Some("dflt"));
    assert_eq!(after.filter_chain.as_deref(), Some("upper"));
    assert!(!after.apply_filters_to_default);
}

#[test]
fn test_embedded_colons_are_never_defaults() {
    let tags = [
        "x|s/:/-/g",
        "x|s/a/b:c/",
        "x|onmatch(/:/,:)",
        "x|onmatch(/a/,b:c)nomatch(d:e)",
        "x|slice(1:2)",
        "x|slice(::-1)|join(:)",
        "x|upper|s/(\\d):(\\d)/$2:$1/g",
    ];
    for tag in tags {
        let expr = parse_tag_expression(tag);
        assert_eq!(expr.default_text, None, "tag {tag} has no default");
        assert_eq!(
            expr.filter_chain.as_deref(),
            Some(&tag[2..]),
            "tag {tag} keeps its whole chain"
        );
    }
}

#[test]
fn test_real_default_after_embedded_colons() {
    let expr = parse_tag_expression("x|slice(1:2)|join(:):none");
    assert_eq!(expr.filter_chain.as_deref(), Some("slice(1:2)|join(:)"));
    assert_eq!(expr.default_text.as_deref(), Some("none"));
}

#[test]
fn test_default_value_magic_braces() {
    let expr = parse_tag_expression("x:~y");
    assert_eq!(expr.default_value(), Some(Value::Snippet("{~y}".to_string())));

    let expr = parse_tag_expression(r"x:\~y");
    assert_eq!(expr.default_value(), Some(Value::text("~y")));

    let expr = parse_tag_expression("x:$5.00");
    assert_eq!(expr.default_value(), Some(Value::text("$5.00")));
}

#[test]
fn test_tag_expression_serializes() {
    let expr = TagExpression::parse("a.b|upper");
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "path": ["a", "b"],
            "filter_chain": "upper",
            "apply_filters_to_default": false
        })
    );
}

#[test]
fn test_chain_splitting_respects_filter_shapes() {
    assert_eq!(
        split_filters("s/a|b/c/g|upper|onmatch(/x|y/,1)nomatch(2)|trim"),
        vec!["s/a|b/c/g", "upper", "onmatch(/x|y/,1)nomatch(2)", "trim"]
    );
    assert_eq!(split_filters(r"join(\|)|upper"), vec![r"join(\|)", "upper"]);
}

#[test]
fn test_invocation_forms() {
    let bare = FilterInvocation::parse("trim");
    assert_eq!(bare.form, InvocationForm::Bare);
    assert_eq!(bare.args, vec!["trim"]);

    let call = FilterInvocation::parse("join(, )");
    assert_eq!(call.form, InvocationForm::Call);
    assert_eq!(call.raw_args.as_deref(), Some(", "));

    let regex = FilterInvocation::parse("/a/b/");
    assert_eq!(regex.form, InvocationForm::RegexLiteral);
    assert_eq!(regex.name, "");
}

#[test]
fn test_argument_conventions() {
    assert_eq!(parse_args(r#""x*y","%d",~y"#), vec!["x*y", "%d", "~y"]);
    assert_eq!(parse_args("a, b"), vec!["a", " b"]);
    let call = FilterInvocation::parse("onmatch(/a/,1)nomatch(2)");
    assert_eq!(call.args, vec!["/a/", "1", NOMATCH_SENTINEL, "2"]);
}
