//! Encodings and digests.

use super::FilterContext;
use super::text::map_text;
use crate::expression::FilterInvocation;
use crate::value::Value;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::Md5;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha1::{Digest, Sha1};

/// Form encoding keeps alphanumerics and `*-._`; space is handled apart.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

pub fn url_encode(text: &str) -> String {
    text.split(' ')
        .map(|part| utf8_percent_encode(part, FORM).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

pub fn url_decode(text: &str) -> String {
    percent_decode_str(&text.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

pub fn base64_decode(text: &str) -> Option<String> {
    let bytes = STANDARD.decode(text.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

pub fn base64_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| STANDARD.encode(s))
}

/// Invalid base64 or non-UTF-8 payloads pass the input through.
pub fn base64decode_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    match base64_decode(&input.to_string()) {
        Some(decoded) => Some(Value::Text(decoded)),
        None => {
            log::debug!("base64decode: input is not valid base64 text");
            Some(input)
        }
    }
}

pub fn md5_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| format!("{:x}", Md5::digest(s.as_bytes())))
}

pub fn md5base64_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| STANDARD.encode(Md5::digest(s.as_bytes())))
}

pub fn sha1_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| format!("{:x}", Sha1::digest(s.as_bytes())))
}

pub fn sha1base64_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, |s| STANDARD.encode(Sha1::digest(s.as_bytes())))
}

pub fn urlencode_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, url_encode)
}

pub fn urldecode_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    map_text(input, url_decode)
}
