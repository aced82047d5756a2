use std::collections::BTreeMap;
use tag_filters::{Engine, EngineConfig, MapResolver, Value};

fn render(template: &str, resolver: &MapResolver) -> String {
    Engine::new().render(template, resolver)
}

fn people() -> MapResolver {
    MapResolver::new()
        .with_value("name", "Ada")
        .with_value("color", "red")
        .with_template("hello", "Hi {~name}!")
}

#[test]
fn test_qcalc_integer_and_float_arithmetic() {
    let resolver = MapResolver::new().with_value("x", "30").with_value("y", "abc");
    assert_eq!(render("{~x|qcalc(*10)}", &resolver), "300");
    assert_eq!(render("{~x|qcalc(^2)}", &resolver), "900");
    assert_eq!(render("{~x|qcalc(/4.0)}", &resolver), "7.5");
    assert_eq!(render("{~x|qcalc(+1.5)}", &resolver), "31.5");
    assert_eq!(
        render("{~y|qcalc(*2)}", &resolver),
        "abc",
        "non-numeric input passes through"
    );
}

#[test]
fn test_global_non_greedy_substitution() {
    let resolver = MapResolver::new().with_value("xyz", "Lemon Lion Liar Loon Lenore Forlorn");
    assert_eq!(
        render("{~xyz|s/L[^ ]*?n/Chunky/g}", &resolver),
        "Chunky Chunky Liar Chunky Chunkyore Forlorn"
    );
}

#[test]
fn test_onmatch_case_insensitive_substring() {
    let tag = "{~hello|onmatch(/E.*O/i,greetings!)nomatch(darn!)}";
    let hella = MapResolver::new().with_value("hello", "hella");
    let hello = MapResolver::new().with_value("hello", "hello");
    assert_eq!(render(tag, &hella), "darn!");
    assert_eq!(render(tag, &hello), "greetings!");
}

#[test]
fn test_onmatch_without_nomatch_blanks_output() {
    let resolver = MapResolver::new().with_value("x", "abc");
    assert_eq!(render("[{~x|onmatch(/z/,yes)}]", &resolver), "[]");
}

#[test]
fn test_onmatch_value_is_rendered_as_a_tag() {
    let resolver = people().with_value("x", "abc");
    assert_eq!(render("{~x|onmatch(/a/,~name)}", &resolver), "Ada");
    assert_eq!(render("{~x|onmatch(/a/,~name)|upper}", &resolver), "ADA");
}

#[test]
fn test_sprintf_grouping_on_default() {
    let resolver = MapResolver::new();
    assert_eq!(
        render("{~x:3000000|sprintf(%,.2f)}", &resolver),
        "3,000,000.00"
    );
}

#[test]
fn test_ordinal_suffixes() {
    for (n, expected) in [
        (1, "st"),
        (2, "nd"),
        (3, "rd"),
        (4, "th"),
        (11, "th"),
        (12, "th"),
        (13, "th"),
        (21, "st"),
    ] {
        let resolver = MapResolver::new().with_value("n", n.to_string());
        assert_eq!(render("{~n|th}", &resolver), expected, "ordinal of {n}");
        assert_eq!(render("{~n|ord}", &resolver), expected, "ordinal of {n}");
    }
}

#[test]
fn test_indent_lines() {
    let resolver = MapResolver::new().with_value("t", "String\nWith\nMany\nLines\n");
    assert_eq!(
        render("{~t|indent(3)}", &resolver),
        "   String\n   With\n   Many\n   Lines\n"
    );
    assert_eq!(
        render("{~t|indent(3,_)}", &resolver),
        "___String\n___With\n___Many\n___Lines\n"
    );

    let crlf = MapResolver::new().with_value("t", "a\r\nb\rc");
    assert_eq!(render("{~t|indent(1,>)}", &crlf), ">a\r\n>b\r>c");
}

#[test]
fn test_base64_round_trip_multibyte() {
    let raw = "Some very long string with Crazy Characters\u{00EE}!";
    let resolver = MapResolver::new().with_value("s", raw);
    assert_eq!(render("{~s|base64|base64decode}", &resolver), raw);
}

#[test]
fn test_urlencode_round_trip() {
    let resolver = MapResolver::new().with_value("s", "% %~");
    assert_eq!(render("{~s|urlencode}", &resolver), "%25+%25%7E");
    assert_eq!(render("{~s|urlencode|urldecode}", &resolver), "% %~");
}

#[test]
fn test_default_placement_controls_filtering() {
    let resolver = people();
    assert_eq!(render("{~missing:none}", &resolver), "none");
    assert_eq!(render("{~name|upper:none}", &resolver), "ADA");
    assert_eq!(
        render("{~missing|upper:none}", &resolver),
        "none",
        "default after the chain is not filtered"
    );
    assert_eq!(
        render("{~missing:none|upper}", &resolver),
        "NONE",
        "default before the chain is filtered"
    );
}

#[test]
fn test_default_with_sigil_is_resolved() {
    let resolver = people();
    assert_eq!(render("{~missing:~name}", &resolver), "Ada");
    assert_eq!(render(r"{~missing:\~name}", &resolver), "~name");
}

#[test]
fn test_undefined_tags() {
    let resolver = MapResolver::new();
    assert_eq!(render("a {~missing} b", &resolver), "a {~missing} b");

    let config = EngineConfig {
        keep_undefined_tags: false,
        ..EngineConfig::default()
    };
    let engine = Engine::with_config(config);
    assert_eq!(engine.render("a {~missing} b", &resolver), "a  b");
}

#[test]
fn test_include_renders_template() {
    let resolver = people();
    assert_eq!(render("{+hello}", &resolver), "Hi Ada!");
    assert_eq!(render("{+hello|upper}", &resolver), "HI ADA!");
}

#[test]
fn test_backtick_sub_reference_in_path() {
    let resolver = MapResolver::new()
        .with_value("users.ada", "Ada Lovelace")
        .with_value("who", "ada");
    assert_eq!(render("{~users.`~who`}", &resolver), "Ada Lovelace");
}

#[test]
fn test_dollar_sigil_and_nested_paths() {
    let resolver = MapResolver::new().with_value("a.b.c", "deep");
    assert_eq!(render("{$a.b.c}", &resolver), "deep");
    assert_eq!(render("{~a.b.c|upper}", &resolver), "DEEP");
}

#[test]
fn test_custom_filter_and_fault_isolation() {
    let mut engine = Engine::new();
    engine.register_filter(
        "shout",
        |input: Option<&Value>, args: &[String]| -> anyhow::Result<Option<Value>> {
            let suffix = args.first().map(String::as_str).unwrap_or("!");
            Ok(input.map(|v| Value::Text(format!("{}{suffix}", v.to_string().to_uppercase()))))
        },
    );
    engine.register_filter(
        "boom",
        |_input: Option<&Value>, _args: &[String]| -> anyhow::Result<Option<Value>> {
            anyhow::bail!("exploded")
        },
    );

    let resolver = people();
    assert_eq!(engine.render("{~name|shout}", &resolver), "ADA!");
    assert_eq!(engine.render("{~name|shout(?)}", &resolver), "ADA?");
    assert_eq!(
        engine.render("{~name|boom|lower}", &resolver),
        "ada",
        "a failing custom filter passes its input through"
    );
}

#[test]
fn test_custom_filter_shadows_stock_filter() {
    let mut engine = Engine::new();
    engine.register_filter(
        "upper",
        |_input: Option<&Value>, _args: &[String]| -> anyhow::Result<Option<Value>> {
            Ok(Some(Value::text("custom")))
        },
    );
    assert_eq!(engine.render("{~name|upper}", &people()), "custom");
}

#[test]
fn test_config_alias_filters() {
    let mut filters = BTreeMap::new();
    filters.insert("shout".to_string(), "upper|s/$/!/".to_string());
    filters.insert("loop".to_string(), "loop".to_string());
    let engine = Engine::with_config(EngineConfig {
        filters,
        ..EngineConfig::default()
    });

    let resolver = people();
    assert_eq!(engine.render("{~name|Shout}", &resolver), "ADA!");
    assert_eq!(
        engine.render("{~name|loop}", &resolver),
        "Ada",
        "a self-referencing alias stops at max depth"
    );
}

#[test]
fn test_registered_alias_expands_to_its_chain() {
    let mut engine = Engine::new();
    engine.register_alias("slug", "trim|lower|s/ +/-/g");
    let resolver = MapResolver::new().with_value("title", "  Big News Today ");
    assert_eq!(engine.render("{~title|slug}", &resolver), "big-news-today");
}

#[test]
fn test_unknown_filter_is_identity() {
    assert_eq!(render("{~name|nosuchfilter(1,2)}", &people()), "Ada");
}

#[test]
fn test_filter_names_are_case_insensitive() {
    assert_eq!(render("{~name|UPPER}", &people()), "ADA");
    assert_eq!(render("{~name|Lc}", &people()), "ada");
}

#[test]
fn test_render_leaves_plain_braces_alone() {
    let resolver = people();
    assert_eq!(
        render("fn() { return {~name}; }", &resolver),
        "fn() { return Ada; }"
    );
    assert_eq!(render(r"\{~name}", &resolver), "{~name}");
}

#[test]
fn test_evaluate_tag_returns_values() {
    let engine = Engine::new();
    let resolver = MapResolver::new().with_value("s", "a b c");
    assert_eq!(
        engine.evaluate_tag("{~s|split}", &resolver),
        Some(Value::list(["a", "b", "c"]))
    );
    assert_eq!(engine.evaluate_tag("{~missing}", &resolver), None);
}
