//! A printf subset for `sprintf` and `calc`.
//!
//! Supported: flags `- + space 0 , #`, width, precision, and conversions
//! `d i x X o f F e E g G s S c b n %`. One value is available; a second
//! consuming conversion is a format error.

use super::FilterContext;
use super::error::FilterError;
use crate::expression::FilterInvocation;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

/// Widest field or precision a conversion may ask for.
pub const MAX_WIDTH: usize = 4096;

/// Format `value` with a printf-style `format`.
pub fn format_value(format: &str, value: &str) -> Result<String, FilterError> {
    let mut out = String::with_capacity(format.len() + value.len());
    let mut chars = format.chars().peekable();
    let mut consumed = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                ',' => spec.group = true,
                '#' => spec.alt = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = read_number(&mut chars, "IllegalFormatWidth", format, value)?;
        if chars.peek() == Some(&'.') {
            chars.next();
            let precision = read_number(&mut chars, "IllegalFormatPrecision", format, value)?;
            spec.precision = Some(precision.unwrap_or(0));
        }
        let Some(conversion) = chars.next() else {
            return Err(format_error("UnknownFormatConversion", "%".into(), format, value));
        };
        spec.conversion = conversion;

        let body = match conversion {
            '%' => "%".to_string(),
            'n' => "\n".to_string(),
            _ if consumed => {
                return Err(format_error(
                    "MissingFormatArgument",
                    format!("Format specifier '%{conversion}'"),
                    format,
                    value,
                ));
            }
            _ => {
                consumed = true;
                convert(&spec, value).map_err(|(kind, message)| {
                    format_error(kind, message, format, value)
                })?
            }
        };
        out.push_str(&body);
    }
    Ok(out)
}

fn format_error(kind: &'static str, message: String, format: &str, value: &str) -> FilterError {
    FilterError::Format {
        kind,
        message,
        format: format.to_string(),
        value: value.to_string(),
    }
}

/// Read a width or precision, rejecting anything above [`MAX_WIDTH`].
fn read_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    kind: &'static str,
    format: &str,
    value: &str,
) -> Result<Option<usize>, FilterError> {
    let mut digits = String::new();
    while let Some(&d) = chars.peek() {
        if !d.is_ascii_digit() {
            break;
        }
        digits.push(d);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_WIDTH => Ok(Some(n)),
        _ => Err(format_error(kind, digits, format, value)),
    }
}

type ConvertResult = Result<String, (&'static str, String)>;

fn convert(spec: &Spec, value: &str) -> ConvertResult {
    let conv = spec.conversion;
    match conv {
        'd' | 'i' | 'x' | 'X' | 'o' => {
            let n = parse_integer(value).ok_or_else(|| mismatch(conv, value))?;
            Ok(format_integer(spec, n))
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let x = value
                .trim()
                .parse::<f64>()
                .map_err(|_| mismatch(conv, value))?;
            Ok(format_float(spec, x))
        }
        's' | 'S' => {
            let mut s: String = match spec.precision {
                Some(p) => value.chars().take(p).collect(),
                None => value.to_string(),
            };
            if conv == 'S' {
                s = s.to_uppercase();
            }
            Ok(pad(spec, "", &s, false))
        }
        'c' => {
            let c = value.chars().next().ok_or_else(|| mismatch(conv, value))?;
            let s = if spec.alt { c.to_uppercase().to_string() } else { c.to_string() };
            Ok(pad(spec, "", &s, false))
        }
        'b' | 'B' => {
            let truth = !matches!(value.trim(), "" | "false");
            let s = if conv == 'B' {
                truth.to_string().to_uppercase()
            } else {
                truth.to_string()
            };
            Ok(pad(spec, "", &s, false))
        }
        other => Err(("UnknownFormatConversion", format!("Conversion = '{other}'"))),
    }
}

fn mismatch(conv: char, value: &str) -> (&'static str, String) {
    let found = if value.trim().parse::<f64>().is_ok() {
        "float"
    } else {
        "text"
    };
    ("IllegalFormatConversion", format!("{conv} != {found}"))
}

/// Integer text, or float text with no fractional part.
fn parse_integer(value: &str) -> Option<i128> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i128>() {
        return Some(n);
    }
    let x = value.parse::<f64>().ok()?;
    (x.is_finite() && x.fract() == 0.0).then_some(x as i128)
}

fn sign_prefix(spec: &Spec, negative: bool) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn format_integer(spec: &Spec, n: i128) -> String {
    match spec.conversion {
        'x' | 'X' | 'o' => {
            // Two's complement for negatives, as 64-bit.
            let bits = n as i64 as u64;
            let (digits, prefix) = match spec.conversion {
                'x' => (format!("{bits:x}"), "0x"),
                'X' => (format!("{bits:X}"), "0X"),
                _ => (format!("{bits:o}"), "0"),
            };
            let prefix = if spec.alt { prefix } else { "" };
            pad(spec, prefix, &digits, true)
        }
        _ => {
            let mut digits = n.unsigned_abs().to_string();
            if spec.group {
                digits = group_thousands(&digits);
            }
            pad(spec, sign_prefix(spec, n < 0), &digits, true)
        }
    }
}

fn format_float(spec: &Spec, x: f64) -> String {
    let upper = spec.conversion.is_ascii_uppercase();
    if !x.is_finite() {
        let text = if x.is_nan() {
            "NaN"
        } else {
            "Infinity"
        };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        return pad(spec, sign_prefix(spec, x < 0.0), &text, false);
    }

    let precision = spec.precision.unwrap_or(6);
    let magnitude = x.abs();
    let body = match spec.conversion.to_ascii_lowercase() {
        'e' => scientific(magnitude, precision),
        'g' => {
            let p = precision.max(1);
            let exponent = if magnitude == 0.0 {
                0
            } else {
                magnitude.log10().floor() as i32
            };
            if magnitude != 0.0 && (magnitude < 1e-4 || exponent >= p as i32) {
                scientific(magnitude, p - 1)
            } else {
                let decimals = (p as i32 - 1 - exponent).max(0) as usize;
                fixed(spec, magnitude, decimals)
            }
        }
        _ => fixed(spec, magnitude, precision),
    };
    let body = if upper { body.to_uppercase() } else { body };
    let negative = x.is_sign_negative() && x != 0.0;
    pad(spec, sign_prefix(spec, negative), &body, true)
}

fn fixed(spec: &Spec, magnitude: f64, decimals: usize) -> String {
    let text = format!("{magnitude:.decimals$}");
    if !spec.group {
        return text;
    }
    match text.split_once('.') {
        Some((int, frac)) => format!("{}.{frac}", group_thousands(int)),
        None => group_thousands(&text),
    }
}

/// `d.ddde+XX` with at least two exponent digits.
fn scientific(magnitude: f64, decimals: usize) -> String {
    let text = format!("{magnitude:.decimals$e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Apply width: spaces on the left (or right with `-`), or zeros between
/// the sign and the digits when `0` is set on a numeric conversion.
fn pad(spec: &Spec, prefix: &str, body: &str, numeric: bool) -> String {
    let len = prefix.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        return format!("{prefix}{body}");
    }
    let fill = width - len;
    if spec.left {
        format!("{prefix}{body}{}", " ".repeat(fill))
    } else if spec.zero && numeric {
        format!("{prefix}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{prefix}{body}", " ".repeat(fill))
    }
}

/// `sprintf(fmt)`; the format is the unsplit argument text so commas in it
/// survive.
pub fn sprintf_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let format = sprintf_format(call)?;
    let value = input.map(|v| v.to_string()).unwrap_or_default();
    Some(Value::Text(match format_value(&format, &value) {
        Ok(out) => out,
        Err(err) => err.to_annotation(),
    }))
}

fn sprintf_format(call: &FilterInvocation) -> Option<String> {
    let raw = call.raw_args.as_deref()?;
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Some(trimmed[1..trimmed.len() - 1].replace("\\\"", "\""));
    }
    Some(raw.to_string())
}
