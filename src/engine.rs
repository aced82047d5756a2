use crate::config::{EngineConfig, default_config};
use crate::expression::include_if::is_include_if;
use crate::expression::{TAG_SIGILS, TagExpression, translate_include_if};
use crate::filter::{CustomFilter, FilterContext, FilterRegistry, apply_filter_chain};
use crate::resolver::Resolver;
use crate::value::Value;

/// Renders tag references and snippet text against a [`Resolver`].
///
/// The stock filter table is static; the engine only owns the overlay of
/// custom filters and config aliases, which is filled during setup and read
/// afterwards. An `Engine` can be shared across threads once built.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: FilterRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(default_config().clone())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let registry = FilterRegistry::with_aliases(&config.filters);
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Register a custom filter. Custom filters shadow aliases and stock
    /// filters of the same name.
    pub fn register_filter(&mut self, name: &str, filter: impl CustomFilter + 'static) {
        self.registry.register(name, filter);
    }

    pub fn register_alias(&mut self, name: &str, chain: &str) {
        self.registry.register_alias(name, chain);
    }

    /// Render one tag, written with its braces: `{~x|upper:none}`.
    pub fn render_tag(&self, tag: &str, resolver: &dyn Resolver) -> String {
        self.render_tag_at(tag, resolver, 0)
    }

    /// Expand every tag in `text`. `\{` yields a literal brace.
    pub fn render(&self, text: &str, resolver: &dyn Resolver) -> String {
        self.render_at(text, resolver, 0)
    }

    /// Value of one tag before it is turned into text; `None` when the tag
    /// is undefined and has no default.
    pub fn evaluate_tag(&self, tag: &str, resolver: &dyn Resolver) -> Option<Value> {
        self.evaluate_body(strip_braces(tag), resolver, 0)
    }

    /// Apply a filter chain to a value directly.
    pub fn evaluate_filter_chain(
        &self,
        chain: &str,
        input: Option<Value>,
        resolver: &dyn Resolver,
    ) -> Option<Value> {
        let ctx = FilterContext::new(self, resolver, 0);
        apply_filter_chain(&ctx, chain, input).map(|v| ctx.settle(v))
    }

    pub(crate) fn render_at(&self, text: &str, resolver: &dyn Resolver, depth: usize) -> String {
        if depth > self.config.max_depth {
            log::warn!(
                "render depth {depth} exceeds max_depth {}, leaving text unexpanded",
                self.config.max_depth
            );
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while let Some(found) = text[i..].find(['{', '\\']) {
            let at = i + found;
            out.push_str(&text[i..at]);

            if text[at..].starts_with("\\{") {
                out.push('{');
                i = at + 2;
                continue;
            }
            if text[at..].starts_with('\\') {
                out.push('\\');
                i = at + 1;
                continue;
            }

            let opens_tag = text[at + 1..].starts_with(TAG_SIGILS);
            match find_tag_close(text, at).filter(|_| opens_tag) {
                Some(close) => {
                    out.push_str(&self.render_tag_at(&text[at..=close], resolver, depth));
                    i = close + 1;
                }
                None => {
                    out.push('{');
                    i = at + 1;
                }
            }
        }
        out.push_str(&text[i..]);
        out
    }

    fn render_tag_at(&self, tag: &str, resolver: &dyn Resolver, depth: usize) -> String {
        let body = strip_braces(tag);
        if !body.starts_with(TAG_SIGILS) {
            return tag.to_string();
        }
        match self.evaluate_body(body, resolver, depth) {
            Some(value) => value.to_string(),
            None if self.config.keep_undefined_tags => tag.to_string(),
            None => String::new(),
        }
    }

    /// Evaluate tag text with its sigil but without braces.
    fn evaluate_body(&self, body: &str, resolver: &dyn Resolver, depth: usize) -> Option<Value> {
        let sigil = body.chars().next().filter(|c| TAG_SIGILS.contains(c))?;
        let rest = &body[sigil.len_utf8()..];
        let ctx = FilterContext::new(self, resolver, depth);

        if is_include_if(rest, sigil) {
            let lookup = |name: &str| {
                let path: Vec<String> = name.split('.').map(str::to_string).collect();
                resolver
                    .resolve(&path, depth)
                    .map(|v| ctx.settle(v).to_string())
            };
            return match translate_include_if(rest, &lookup) {
                Ok(translated) => {
                    log::trace!("includeIf '{rest}' -> '{translated}'");
                    self.evaluate_body(&translated, resolver, depth)
                }
                Err(err) => Some(Value::Text(err.to_annotation())),
            };
        }

        if matches!(sigil, '.' | '^') {
            log::debug!("command tag '{body}' is not handled here");
            return Some(Value::text(""));
        }

        let expr = TagExpression::parse(rest);
        let path = self.expand_path(&expr.path, resolver, depth);
        let value = match sigil {
            '+' => resolver.include(&path.join("."), depth),
            _ => resolver.resolve(&path, depth),
        }
        .map(|v| ctx.settle(v));

        let default = || expr.default_value().map(|v| ctx.settle(v));
        let seed = if expr.apply_filters_to_default {
            value.or_else(default)
        } else {
            value
        };
        let out = match expr.filter_chain.as_deref() {
            Some(chain) => apply_filter_chain(&ctx, chain, seed),
            None => seed,
        };
        let out = if expr.apply_filters_to_default {
            out
        } else {
            out.or_else(default)
        };
        out.map(|v| ctx.settle(v))
    }

    /// Replace backtick sub-references in a path with their rendered text.
    fn expand_path(&self, path: &[String], resolver: &dyn Resolver, depth: usize) -> Vec<String> {
        path.iter()
            .map(|segment| {
                match segment
                    .strip_prefix('`')
                    .and_then(|s| s.strip_suffix('`'))
                {
                    Some(inner) => {
                        self.render_tag_at(&format!("{{{inner}}}"), resolver, depth + 1)
                    }
                    None => segment.clone(),
                }
            })
            .collect()
    }
}

fn strip_braces(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(tag)
}

/// Offset of the `}` closing the tag opened at `open`, counting nested
/// braces and skipping backslash escapes.
fn find_tag_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MapResolver;

    #[test]
    fn test_find_tag_close_nests() {
        let text = "a {~x|onmatch(/a{2}/,{~y})} b";
        let close = find_tag_close(text, 2).unwrap();
        assert_eq!(&text[2..=close], "{~x|onmatch(/a{2}/,{~y})}");
        assert_eq!(find_tag_close("{~x", 0), None);
        assert_eq!(find_tag_close(r"{~x|s/\}/x/}", 0), Some(11));
    }

    #[test]
    fn test_strip_braces() {
        assert_eq!(strip_braces("{~x}"), "~x");
        assert_eq!(strip_braces("~x"), "~x");
    }

    #[test]
    fn test_literal_braces_and_escapes() {
        let engine = Engine::new();
        let resolver = MapResolver::new().with_value("x", "1");
        assert_eq!(engine.render(r"\{~x} {~x} {plain}", &resolver), "{~x} 1 {plain}");
        assert_eq!(engine.render(r"a\b", &resolver), r"a\b");
    }

    #[test]
    fn test_self_reference_terminates() {
        let engine = Engine::new();
        let resolver = MapResolver::new();
        let out = engine.render("{~x:~x}", &resolver);
        assert_eq!(out, "{~x}");
    }
}
