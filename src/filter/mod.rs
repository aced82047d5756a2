//! Filter registry and chain dispatch
//!
//! A filter chain is applied left to right, each filter receiving the
//! previous filter's output:
//!
//! ```text
//! upper|s/ /_/g|indent(2)
//! ```
//!
//! Names are looked up case-insensitively in three tiers: custom filters
//! registered by the host, chain aliases from configuration, then the stock
//! filters. Nothing here fails outward. A faulting custom filter is logged
//! and passes its input through, an unknown name is a no-op, and malformed
//! arguments degrade to pass-through or an inline `[...]` annotation.
//!
//! # Stock filters
//!
//! - text: `trim`, `qs`, `upper`, `lower`, `capitalize`, `indent`, `defang`,
//!   `xmlescape`, `unescapexml`
//! - lists: `join`, `get`, `split`, `length`, `slice`, `reverse`, `sort`
//! - matching: `s/../../`, `onmatch(..)nomatch(..)`, `ondefined`, `default`
//! - forms: `selected`, `checked`, `alternate`, `th`
//! - numbers: `sprintf`, `qcalc`, `calc`
//! - encodings: `base64`, `base64decode`, `md5`, `sha1`, `urlencode`, `urldecode`

pub mod calc;
pub mod codec;
pub mod error;
pub mod format;
pub mod list;
pub mod onmatch;
pub mod regex;
pub mod registry;
pub mod slice;
pub mod text;

pub use error::FilterError;
pub use registry::{BuiltinFn, CustomFilter, FilterRegistry, builtin, builtin_names};
pub use slice::Slice;

use crate::engine::Engine;
use crate::expression::{FilterInvocation, split_first_filter};
use crate::resolver::Resolver;
use crate::value::Value;

/// What a filter can reach while it runs: the engine (for nested
/// rendering and configuration) and the resolver of the current render.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub engine: &'a Engine,
    pub resolver: &'a dyn Resolver,
    pub depth: usize,
}

impl<'a> FilterContext<'a> {
    pub fn new(engine: &'a Engine, resolver: &'a dyn Resolver, depth: usize) -> Self {
        Self {
            engine,
            resolver,
            depth,
        }
    }

    pub fn deeper(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Render a snippet one level deeper; other values are returned as is.
    pub fn settle(&self, value: Value) -> Value {
        match value {
            Value::Snippet(template) => {
                Value::Text(self.engine.render_at(&template, self.resolver, self.depth + 1))
            }
            other => other,
        }
    }
}

/// Apply `chain` to `input`, settling snippet results between filters.
pub fn apply_filter_chain(
    ctx: &FilterContext<'_>,
    chain: &str,
    input: Option<Value>,
) -> Option<Value> {
    let mut value = input;
    let mut rest = Some(chain);
    while let Some(text) = rest {
        let (head, tail) = split_first_filter(text);
        if !head.is_empty() {
            value = apply_filter(ctx, head, value).map(|v| ctx.settle(v));
        }
        rest = tail;
    }
    value
}

/// Apply one filter invocation.
pub fn apply_filter(ctx: &FilterContext<'_>, text: &str, input: Option<Value>) -> Option<Value> {
    let call = FilterInvocation::parse(text);
    let key = call.name.to_lowercase();
    let registry = ctx.engine.registry();

    if let Some(custom) = registry.custom(&key) {
        return match custom.apply(input.as_ref(), call.call_args()) {
            Ok(output) => output,
            Err(source) => {
                let err = FilterError::Custom {
                    name: call.name.clone(),
                    source,
                };
                log::warn!("{err}");
                input
            }
        };
    }

    if let Some(chain) = registry.alias(&key) {
        if ctx.depth >= ctx.engine.config().max_depth {
            log::warn!("filter alias '{key}' exceeded max depth {}", ctx.engine.config().max_depth);
            return input;
        }
        return apply_filter_chain(&ctx.deeper(), chain, input);
    }

    match builtin(&key) {
        Some(apply) => apply(ctx, input, &call),
        None => {
            log::trace!("unknown filter '{}', passing input through", call.name);
            input
        }
    }
}
