//! Tag-expression parsing
//!
//! The content of a tag reference is a flat string with several embedded
//! sub-grammars and no formal parser behind it:
//!
//! ```text
//! tag        := path [ ':' default ] [ '|' chain ] | path [ '|' chain ] [ ':' default ]
//! path       := segment ('.' segment)*
//! chain      := invocation ('|' invocation)*
//! invocation := name '(' args ')' | name '/' pattern '/' [flags]... | name
//! args       := quoted-pair | comma-list
//! ```
//!
//! Everything here is single-pass, index-based scanning over the raw text
//! and never fails: malformed input degrades to pass-through text.

pub mod args;
pub mod chain;
pub mod include_if;
pub mod invocation;
pub mod scanner;
pub mod tag;

pub use args::{NOMATCH_SENTINEL, parse_arg_list, parse_args};
pub use chain::{split_filters, split_first_filter};
pub use include_if::{IncludeIfError, translate_include_if};
pub use invocation::{FilterInvocation, InvocationForm};
pub use scanner::{Cursor, next_unescaped_delim};
pub use tag::{TAG_SIGILS, TagExpression, magic_braces, parse_tag_expression};
