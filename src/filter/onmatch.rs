use super::FilterContext;
use super::regex::RegexDirective;
use crate::expression::{FilterInvocation, NOMATCH_SENTINEL, magic_braces};
use crate::value::Value;

/// `onmatch(/re1/,out1,/re2/,out2,...)nomatch(fallback)`
///
/// Pairs are tried in order and the first test that finds a match in the
/// input wins. A null input skips every test but still reaches the
/// `nomatch` fallback. With no match and no fallback the result is empty.
pub fn onmatch_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let subject = input.as_ref().map(Value::to_string);

    for pair in call.call_args().chunks(2) {
        let test = pair[0].as_str();
        let output = pair.get(1).map(String::as_str).unwrap_or_default();

        if test == NOMATCH_SENTINEL {
            return Some(magic_braces(output));
        }
        let Some(subject) = subject.as_deref() else {
            continue;
        };

        match RegexDirective::parse_match(test).and_then(|d| d.compile()) {
            Ok(re) if re.is_match(subject) => return Some(magic_braces(output)),
            Ok(_) => {}
            Err(err) => log::warn!("onmatch: skipping test '{test}': {err}"),
        }
    }

    Some(Value::text(""))
}
