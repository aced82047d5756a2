use tag_filters::expression::{IncludeIfError, translate_include_if};
use tag_filters::{Engine, MapResolver};

fn translate(body: &str) -> Result<String, IncludeIfError> {
    translate_include_if(body, &|name: &str| match name {
        "x" => Some("a+b".to_string()),
        _ => None,
    })
}

fn site() -> MapResolver {
    MapResolver::new()
        .with_value("name", "Ada")
        .with_value("color", "red")
        .with_value("favorite", "red")
        .with_value("empty", "")
        .with_template("hello", "Hi {~name}!")
}

#[test]
fn test_translation_table() {
    assert_eq!(translate("(~x)tpl").unwrap(), "~x|ondefined(+tpl):");
    assert_eq!(translate("(!x)tpl").unwrap(), "~x|ondefined():+tpl");
    assert_eq!(
        translate("(~x == on)tpl").unwrap(),
        "~x|onmatch(/^on$/,+tpl)nomatch()"
    );
    assert_eq!(
        translate("(~x != on)tpl").unwrap(),
        "~x|onmatch(/^on$/,)nomatch(+tpl)"
    );
    assert_eq!(
        translate("(~x =~ /^a/i)tpl").unwrap(),
        "~x|onmatch(/^a/i,+tpl)nomatch()"
    );
    assert_eq!(
        translate("(~x !~ /^a/)tpl").unwrap(),
        "~x|onmatch(/^a/,)nomatch(+tpl)"
    );
}

#[test]
fn test_path_comparison_reads_left_side_eagerly() {
    assert_eq!(
        translate("(~x == ~y)tpl").unwrap(),
        r"~y|onmatch(/^a\+b$/,+tpl)nomatch()"
    );
}

#[test]
fn test_dotted_form_matches_plus_form() {
    assert_eq!(
        translate("includeIf(~x).tpl").unwrap(),
        translate("(~x)tpl").unwrap()
    );
}

#[test]
fn test_malformed_shorthand_is_an_error() {
    assert!(matches!(
        translate("(~x)"),
        Err(IncludeIfError::MissingTemplate(_))
    ));
    assert!(matches!(
        translate("~x tpl"),
        Err(IncludeIfError::MissingCondition(_))
    ));
    assert!(matches!(
        translate("(~x =~ abc)tpl"),
        Err(IncludeIfError::ExpectedRegex { .. })
    ));
}

#[test]
fn test_render_defined_and_not_defined() {
    let engine = Engine::new();
    let resolver = site();
    assert_eq!(engine.render("[{+(~name)hello}]", &resolver), "[Hi Ada!]");
    assert_eq!(engine.render("[{+(~nobody)hello}]", &resolver), "[]");
    assert_eq!(engine.render("[{+(~empty)hello}]", &resolver), "[]");
    assert_eq!(engine.render("[{+(!nobody)hello}]", &resolver), "[Hi Ada!]");
    assert_eq!(engine.render("[{+(!name)hello}]", &resolver), "[]");
}

#[test]
fn test_render_comparisons() {
    let engine = Engine::new();
    let resolver = site();
    assert_eq!(engine.render("{+(~color == red)hello}", &resolver), "Hi Ada!");
    assert_eq!(engine.render("[{+(~color == blue)hello}]", &resolver), "[]");
    assert_eq!(engine.render("[{+(~color != red)hello}]", &resolver), "[]");
    assert_eq!(engine.render("{+(~color != blue)hello}", &resolver), "Hi Ada!");
    assert_eq!(engine.render("{+(~color =~ /^r/)hello}", &resolver), "Hi Ada!");
    assert_eq!(engine.render("{+(~color == ~favorite)hello}", &resolver), "Hi Ada!");
}

#[test]
fn test_render_command_forms() {
    let engine = Engine::new();
    let resolver = site();
    assert_eq!(engine.render("{.includeIf(~color).hello}", &resolver), "Hi Ada!");
    assert_eq!(engine.render("{^includeIf(~name).hello}", &resolver), "Hi Ada!");
}

#[test]
fn test_render_syntax_error_inline() {
    let engine = Engine::new();
    let out = engine.render("a {+(~color =~ red)hello} b", &site());
    assert!(
        out.starts_with("a [includeIf syntax error:"),
        "got {out}"
    );
    assert!(out.ends_with("] b"), "got {out}");
}
