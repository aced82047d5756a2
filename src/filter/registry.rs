use super::FilterContext;
use super::{calc, codec, format, list, onmatch, regex, slice, text};
use crate::expression::FilterInvocation;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

/// Signature shared by every stock filter.
pub type BuiltinFn = fn(&FilterContext<'_>, Option<Value>, &FilterInvocation) -> Option<Value>;

struct Builtin {
    names: &'static [&'static str],
    apply: BuiltinFn,
}

/// Stock filters. The regex-literal form dispatches under `s` and under the
/// empty name (`/pat/repl/`).
static BUILTINS: &[Builtin] = &[
    Builtin { names: &["s", ""], apply: regex::substitution_filter },
    Builtin { names: &["onmatch"], apply: onmatch::onmatch_filter },
    Builtin { names: &["slice"], apply: slice::slice_filter },
    Builtin { names: &["reverse"], apply: slice::reverse_filter },
    Builtin { names: &["join"], apply: list::join_filter },
    Builtin { names: &["get"], apply: list::get_filter },
    Builtin { names: &["split"], apply: list::split_filter },
    Builtin { names: &["length", "len", "size"], apply: list::length_filter },
    Builtin { names: &["sort"], apply: list::sort_filter },
    Builtin { names: &["trim"], apply: text::trim_filter },
    Builtin { names: &["qs", "quoted", "escapequotes"], apply: text::quote_filter },
    Builtin { names: &["upper", "uc"], apply: text::upper_filter },
    Builtin { names: &["lower", "lc"], apply: text::lower_filter },
    Builtin { names: &["capitalize", "cap"], apply: text::capitalize_filter },
    Builtin { names: &["indent"], apply: text::indent_filter },
    Builtin { names: &["defang", "noxss"], apply: text::defang_filter },
    Builtin { names: &["selected"], apply: text::selected_filter },
    Builtin { names: &["checked"], apply: text::checked_filter },
    Builtin { names: &["alternate", "evenodd"], apply: text::alternate_filter },
    Builtin { names: &["th", "ord"], apply: text::ordinal_filter },
    Builtin { names: &["ondefined"], apply: text::ondefined_filter },
    Builtin { names: &["default"], apply: text::default_filter },
    Builtin { names: &["type"], apply: text::type_filter },
    Builtin { names: &["xmlescape", "escapexml", "html"], apply: text::xmlescape_filter },
    Builtin { names: &["unescapexml"], apply: text::unescapexml_filter },
    Builtin { names: &["sprintf"], apply: format::sprintf_filter },
    Builtin { names: &["qcalc"], apply: calc::qcalc_filter },
    Builtin { names: &["calc"], apply: calc::calc_filter },
    Builtin { names: &["base64"], apply: codec::base64_filter },
    Builtin { names: &["base64decode"], apply: codec::base64decode_filter },
    Builtin { names: &["md5"], apply: codec::md5_filter },
    Builtin { names: &["md5base64"], apply: codec::md5base64_filter },
    Builtin { names: &["sha1"], apply: codec::sha1_filter },
    Builtin { names: &["sha1base64"], apply: codec::sha1base64_filter },
    Builtin { names: &["urlencode"], apply: codec::urlencode_filter },
    Builtin { names: &["urldecode"], apply: codec::urldecode_filter },
];

static BUILTIN_INDEX: LazyLock<HashMap<&'static str, BuiltinFn>> = LazyLock::new(|| {
    BUILTINS
        .iter()
        .flat_map(|b| b.names.iter().map(move |&name| (name, b.apply)))
        .collect()
});

/// Look up a stock filter by lowercased name.
pub fn builtin(name: &str) -> Option<BuiltinFn> {
    BUILTIN_INDEX.get(name).copied()
}

/// Every stock filter name, sorted.
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILTIN_INDEX.keys().copied().filter(|n| !n.is_empty()).collect();
    names.sort_unstable();
    names
}

/// A filter supplied by the embedding application.
///
/// Returning `Err` is treated as a fault: it is logged and the input is
/// passed through unchanged.
pub trait CustomFilter: Send + Sync {
    fn apply(&self, input: Option<&Value>, args: &[String]) -> anyhow::Result<Option<Value>>;
}

impl<F> CustomFilter for F
where
    F: Fn(Option<&Value>, &[String]) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    fn apply(&self, input: Option<&Value>, args: &[String]) -> anyhow::Result<Option<Value>> {
        self(input, args)
    }
}

/// The overlay consulted before the stock filters: programmatic custom
/// filters first, then chain aliases from configuration.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    custom: HashMap<String, Arc<dyn CustomFilter>>,
    aliases: HashMap<String, String>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: &BTreeMap<String, String>) -> Self {
        Self {
            custom: HashMap::new(),
            aliases: aliases
                .iter()
                .map(|(name, chain)| (name.to_lowercase(), chain.clone()))
                .collect(),
        }
    }

    pub fn register(&mut self, name: &str, filter: impl CustomFilter + 'static) {
        self.custom.insert(name.to_lowercase(), Arc::new(filter));
    }

    pub fn register_alias(&mut self, name: &str, chain: &str) {
        self.aliases.insert(name.to_lowercase(), chain.to_string());
    }

    pub fn custom(&self, name: &str) -> Option<&Arc<dyn CustomFilter>> {
        self.custom.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut custom: Vec<_> = self.custom.keys().collect();
        custom.sort();
        f.debug_struct("FilterRegistry")
            .field("custom", &custom)
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_share_one_entry() {
        for (a, b) in [("uc", "upper"), ("len", "length"), ("ord", "th"), ("noxss", "defang")] {
            assert_eq!(
                builtin(a).map(|f| f as usize),
                builtin(b).map(|f| f as usize),
                "{a} should alias {b}"
            );
        }
    }

    #[test]
    fn test_unknown_name_is_absent() {
        assert!(builtin("nosuchfilter").is_none());
        assert!(builtin_names().contains(&"sprintf"));
        assert!(!builtin_names().contains(&""));
    }

    #[test]
    fn test_registry_keys_are_case_insensitive() {
        let mut registry = FilterRegistry::new();
        registry.register(
            "Shout",
            |input: Option<&Value>, _args: &[String]| -> anyhow::Result<Option<Value>> {
                Ok(input.map(|v| Value::Text(v.to_string().to_uppercase())))
            },
        );
        registry.register_alias("Loud", "upper");
        assert!(registry.custom("shout").is_some());
        assert_eq!(registry.alias("loud"), Some("upper"));
    }
}
