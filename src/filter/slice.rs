use super::FilterContext;
use crate::expression::FilterInvocation;
use crate::value::Value;

/// A python-style `[from:to:step]` range. `None` means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub const REVERSE: Slice = Slice {
        from: None,
        to: None,
        step: Some(-1),
    };

    /// Accepts a single `from:to:step` argument (any part may be empty) or
    /// legacy positional `from`, `to`, `step` arguments.
    pub fn parse(args: &[String]) -> Self {
        if let [single] = args {
            if single.contains(':') {
                let mut parts = single.splitn(3, ':').map(parse_index);
                return Self {
                    from: parts.next().flatten(),
                    to: parts.next().flatten(),
                    step: parts.next().flatten(),
                };
            }
        }
        let mut parts = args.iter().map(|a| parse_index(a));
        Self {
            from: parts.next().flatten(),
            to: parts.next().flatten(),
            step: parts.next().flatten(),
        }
    }

    /// Normalized `(from, to, step)` for a sequence of `len` items.
    ///
    /// Negative bounds count from the end and clamp at 0. A zero step, or a
    /// step whose sign disagrees with `to - from`, collapses the range to
    /// nothing at `from`.
    pub fn bounds(&self, len: usize) -> (i64, i64, i64) {
        let len = len as i64;
        let mut step = self.step.unwrap_or(1);
        let normalize = |i: i64| if i < 0 { (i + len).max(0) } else { i };

        let mut from = match self.from {
            Some(f) => normalize(f),
            None if step < 0 => len - 1,
            None => 0,
        };
        let mut to = match self.to {
            Some(t) => normalize(t),
            None if step < 0 => -1,
            None => len,
        };

        from = from.min(len);
        to = to.min(len);
        if step == 0 {
            step = 1;
            to = from;
        }
        if step < 0 && from >= len {
            from = len - 1;
        }
        if (step > 0 && to < from) || (step < 0 && to > from) {
            to = from;
        }
        (from, to, step)
    }

    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let (from, to, step) = self.bounds(items.len());
        if step == 1 {
            return items[from as usize..to as usize].to_vec();
        }

        let mut out = Vec::new();
        let mut i = from;
        while (step > 0 && i < to) || (step < 0 && i > to) {
            if let Some(item) = usize::try_from(i).ok().and_then(|i| items.get(i)) {
                out.push(item.clone());
            }
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        out
    }
}

fn parse_index(part: &str) -> Option<i64> {
    let part = part.trim();
    if part.is_empty() {
        return None;
    }
    part.parse::<i64>()
        .ok()
        .or_else(|| part.parse::<f64>().ok().map(|f| f.trunc() as i64))
}

/// Slice a list, an inline-table text, or the characters of plain text.
pub fn slice_value(value: Value, slice: &Slice) -> Value {
    if let Some(items) = value.to_list() {
        return Value::List(slice.apply(&items));
    }
    match value {
        Value::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            Value::Text(slice.apply(&chars).into_iter().collect())
        }
        other => other,
    }
}

pub fn slice_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    call: &FilterInvocation,
) -> Option<Value> {
    let slice = Slice::parse(call.call_args());
    input.map(|v| slice_value(v, &slice))
}

/// `reverse` is `slice(::-1)`.
pub fn reverse_filter(
    _ctx: &FilterContext<'_>,
    input: Option<Value>,
    _call: &FilterInvocation,
) -> Option<Value> {
    input.map(|v| slice_value(v, &Slice::REVERSE))
}
