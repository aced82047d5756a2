//! Arithmetic filters: `qcalc(op num)` and `calc("expr"[,"fmt"][,vars...])`.

use super::FilterContext;
use super::error::FilterError;
use super::format::format_value;
use crate::expression::{FilterInvocation, TAG_SIGILS, magic_braces};
use crate::value::Value;

/// A parsed operand. Integer arithmetic is used until a float appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Integer text stays integral; anything with a decimal point or
    /// exponent is a float.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Number::Int(n));
            }
        }
        text.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Number::Float)
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }

    pub fn apply(self, op: char, rhs: Number) -> Option<Number> {
        if let (Number::Int(a), Number::Int(b)) = (self, rhs) {
            let int = match op {
                '+' => a.checked_add(b),
                '-' => a.checked_sub(b),
                '*' => a.checked_mul(b),
                '/' => a.checked_div(b),
                '%' => a.checked_rem(b),
                '^' => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
                _ => return None,
            };
            if let Some(n) = int {
                return Some(Number::Int(n));
            }
            if b == 0 && matches!(op, '/' | '%') {
                return None;
            }
        }

        let (a, b) = (self.as_f64(), rhs.as_f64());
        let x = match op {
            '+' => a + b,
            '-' => a - b,
            '*' => a * b,
            '/' => a / b,
            '%' => a % b,
            '^' => a.powf(b),
            _ => return None,
        };
        x.is_finite().then_some(Number::Float(x))
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{x:.1}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

/// `qcalc(*10)`: one operator and one operand against the input.
/// Non-numeric input or operand passes the input through.
pub fn qcalc_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let expr = call.raw_args.as_deref().unwrap_or_default().trim();
    let mut chars = expr.chars();
    let Some(op) = chars.next() else {
        return Some(input);
    };

    let result = Number::parse(&input.to_string())
        .zip(Number::parse(chars.as_str()))
        .and_then(|(lhs, rhs)| lhs.apply(op, rhs));
    match result {
        Some(n) => Some(Value::Text(n.to_string())),
        None => Some(input),
    }
}

/// `calc("expr","fmt",vars...)`. `x` (or `$x`) is the input; any other
/// identifier binds to the next extra argument in order of first
/// appearance. Extra arguments may be tag references.
pub fn calc_filter(
    ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let input = input?;
    let args = call.call_args();
    let Some(expr) = args.first() else {
        return Some(input);
    };

    let (format, vars) = match args.get(1) {
        Some(f) if f.contains('%') => (Some(f.as_str()), &args[2..]),
        _ => (None, args.get(1..).unwrap_or_default()),
    };
    let bound: Vec<Option<Number>> = vars
        .iter()
        .map(|arg| Number::parse(&resolve_arg(ctx, arg)))
        .collect();

    let Some(x) = Number::parse(&input.to_string()) else {
        return Some(input);
    };
    let result = match evaluate(expr, x, &bound) {
        Ok(n) => n,
        Err(err) => {
            log::debug!("calc: {err}");
            return Some(input);
        }
    };

    let text = match format {
        Some(f) => format_value(f, &result.to_string()).unwrap_or_else(|e| e.to_annotation()),
        None => result.to_string(),
    };
    Some(Value::Text(text))
}

fn resolve_arg(ctx: &FilterContext<'_>, arg: &str) -> String {
    let arg = arg.trim();
    if arg.starts_with(TAG_SIGILS) {
        return ctx.settle(magic_braces(arg)).to_string();
    }
    arg.to_string()
}

/// Deepest operator/parenthesis nesting an expression may use.
const MAX_NESTING: usize = 256;

/// Evaluate an arithmetic expression with `x` bound to `input`.
pub fn evaluate(expr: &str, input: Number, vars: &[Option<Number>]) -> Result<Number, FilterError> {
    let mut parser = ExprParser {
        src: expr.as_bytes(),
        pos: 0,
        input,
        vars,
        names: Vec::new(),
        depth: 0,
    };
    let value = parser.sum()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(parser.error());
    }
    Ok(value)
}

struct ExprParser<'a> {
    src: &'a [u8],
    pos: usize,
    input: Number,
    vars: &'a [Option<Number>],
    names: Vec<String>,
    depth: usize,
}

impl ExprParser<'_> {
    fn error(&self) -> FilterError {
        FilterError::NotANumber(String::from_utf8_lossy(self.src).into_owned())
    }

    fn skip_ws(&mut self) {
        while self.src.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek_op(&mut self, ops: &[u8]) -> Option<char> {
        self.skip_ws();
        let b = *self.src.get(self.pos)?;
        ops.contains(&b).then_some(b as char)
    }

    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, FilterError>,
    ) -> Result<T, FilterError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error());
        }
        self.depth += 1;
        let out = rule(self);
        self.depth -= 1;
        out
    }

    fn binary(&self, lhs: Number, op: char, rhs: Number) -> Result<Number, FilterError> {
        lhs.apply(op, rhs).ok_or_else(|| self.error())
    }

    fn sum(&mut self) -> Result<Number, FilterError> {
        let mut lhs = self.product()?;
        while let Some(op) = self.peek_op(b"+-") {
            self.pos += 1;
            let rhs = self.product()?;
            lhs = self.binary(lhs, op, rhs)?;
        }
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Number, FilterError> {
        let mut lhs = self.power()?;
        while let Some(op) = self.peek_op(b"*/%") {
            self.pos += 1;
            let rhs = self.power()?;
            lhs = self.binary(lhs, op, rhs)?;
        }
        Ok(lhs)
    }

    /// Right-associative.
    fn power(&mut self) -> Result<Number, FilterError> {
        self.nested(|p| {
            let base = p.unary()?;
            if p.peek_op(b"^").is_some() {
                p.pos += 1;
                let exponent = p.power()?;
                return p.binary(base, '^', exponent);
            }
            Ok(base)
        })
    }

    fn unary(&mut self) -> Result<Number, FilterError> {
        self.nested(|p| match p.peek_op(b"-+") {
            Some('-') => {
                p.pos += 1;
                let operand = p.unary()?;
                p.binary(Number::Int(0), '-', operand)
            }
            Some(_) => {
                p.pos += 1;
                p.unary()
            }
            None => p.atom(),
        })
    }

    fn atom(&mut self) -> Result<Number, FilterError> {
        self.skip_ws();
        let start = self.pos;
        match self.src.get(self.pos).copied() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.sum()?;
                self.skip_ws();
                if self.src.get(self.pos) != Some(&b')') {
                    return Err(self.error());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => {
                while self
                    .src
                    .get(self.pos)
                    .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
                {
                    self.pos += 1;
                }
                let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();
                Number::parse(text).ok_or_else(|| self.error())
            }
            Some(b) if b == b'$' || b == b'_' || b.is_ascii_alphabetic() => {
                if b == b'$' {
                    self.pos += 1;
                }
                let name_start = self.pos;
                while self
                    .src
                    .get(self.pos)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                {
                    self.pos += 1;
                }
                let name = String::from_utf8_lossy(&self.src[name_start..self.pos]).into_owned();
                self.variable(name)
            }
            _ => Err(self.error()),
        }
    }

    fn variable(&mut self, name: String) -> Result<Number, FilterError> {
        if name == "x" {
            return Ok(self.input);
        }
        let slot = match self.names.iter().position(|n| *n == name) {
            Some(slot) => slot,
            None => {
                self.names.push(name);
                self.names.len() - 1
            }
        };
        self.vars
            .get(slot)
            .copied()
            .flatten()
            .ok_or_else(|| self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, x: i64) -> String {
        evaluate(expr, Number::Int(x), &[]).unwrap().to_string()
    }

    #[test]
    fn test_int_and_float_selection() {
        assert_eq!(Number::Int(30).apply('*', Number::Int(10)), Some(Number::Int(300)));
        assert_eq!(Number::Int(30).apply('^', Number::Int(2)), Some(Number::Int(900)));
        assert_eq!(
            Number::Int(3).apply('*', Number::parse("1.5").unwrap()),
            Some(Number::Float(4.5))
        );
        assert_eq!(Number::Int(7).apply('/', Number::Int(2)), Some(Number::Int(3)));
        assert_eq!(Number::Int(7).apply('/', Number::Int(0)), None);
    }

    #[test]
    fn test_float_display_keeps_a_decimal() {
        assert_eq!(Number::Float(6.0).to_string(), "6.0");
        assert_eq!(Number::Float(2.25).to_string(), "2.25");
    }

    #[test]
    fn test_expression_precedence() {
        assert_eq!(eval("x*2+1", 5), "11");
        assert_eq!(eval("x*(2+1)", 5), "15");
        assert_eq!(eval("2^3^2", 0), "512");
        assert_eq!(eval("-x+1", 5), "-4");
        assert_eq!(eval("$x % 3", 10), "1");
    }

    #[test]
    fn test_extra_variables_bind_in_order() {
        let vars = [Some(Number::Int(4)), Some(Number::Int(10))];
        let n = evaluate("x*y+z-y", Number::Int(2), &vars).unwrap();
        assert_eq!(n, Number::Int(14));
    }

    #[test]
    fn test_bad_expressions() {
        assert!(evaluate("x+", Number::Int(1), &[]).is_err());
        assert!(evaluate("(x", Number::Int(1), &[]).is_err());
        assert!(evaluate("x*q", Number::Int(1), &[]).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let signs = format!("{}x", "-".repeat(200_000));
        assert!(evaluate(&signs, Number::Int(3), &[]).is_err());
        let parens = format!("{}x{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(evaluate(&parens, Number::Int(3), &[]).is_err());
        let powers = format!("x{}", "^1".repeat(200_000));
        assert!(evaluate(&powers, Number::Int(3), &[]).is_err());

        assert_eq!(eval(&format!("{}x{}", "(".repeat(50), ")".repeat(50)), 7), "7");
        assert_eq!(eval(&format!("{}x", "-".repeat(100)), 7), "7");
    }
}
