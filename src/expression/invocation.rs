use super::args::parse_arg_list;
use super::scanner::find_matching_close;

/// How a filter was written in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationForm {
    /// `name`
    Bare,
    /// `name(args)`
    Call,
    /// `s/pattern/replacement/flags` or `/pattern/flags`
    RegexLiteral,
}

/// One parsed element of a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterInvocation {
    pub name: String,
    /// Filter-specific arguments. A bare invocation carries its own text as
    /// the single argument; a regex literal carries the whole literal.
    pub args: Vec<String>,
    /// Unsplit text between the parentheses, for filters whose argument may
    /// legitimately contain commas.
    pub raw_args: Option<String>,
    pub form: InvocationForm,
    /// The invocation text as written.
    pub text: String,
}

impl FilterInvocation {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let paren = text.find('(');
        let slash = text.find('/');

        match (paren, slash) {
            (p, Some(s)) if p.is_none_or(|p| s < p) => Self {
                name: text[..s].trim().to_string(),
                args: vec![text.to_string()],
                raw_args: None,
                form: InvocationForm::RegexLiteral,
                text: text.to_string(),
            },
            (Some(p), _) => {
                let raw_args = match find_matching_close(text, p) {
                    Some(close) => &text[p + 1..close],
                    None => &text[p + 1..],
                };
                Self {
                    name: text[..p].trim().to_string(),
                    args: parse_arg_list(&text[p..]),
                    raw_args: Some(raw_args.to_string()),
                    form: InvocationForm::Call,
                    text: text.to_string(),
                }
            }
            _ => Self {
                name: text.to_string(),
                args: vec![text.to_string()],
                raw_args: None,
                form: InvocationForm::Bare,
                text: text.to_string(),
            },
        }
    }

    pub fn is_regex_literal(&self) -> bool {
        self.form == InvocationForm::RegexLiteral
    }

    /// Positional argument `i`, only when the filter was called with a
    /// parenthesized list.
    pub fn arg(&self, i: usize) -> Option<&str> {
        match self.form {
            InvocationForm::Call => self.args.get(i).map(String::as_str),
            _ => None,
        }
    }

    /// Call-form arguments, empty for bare and regex-literal forms.
    pub fn call_args(&self) -> &[String] {
        match self.form {
            InvocationForm::Call => &self.args,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation() {
        let call = FilterInvocation::parse("upper");
        assert_eq!(call.name, "upper");
        assert_eq!(call.args, vec!["upper"]);
        assert_eq!(call.arg(0), None);
    }

    #[test]
    fn test_call_invocation() {
        let call = FilterInvocation::parse("indent(3,_)");
        assert_eq!(call.name, "indent");
        assert_eq!(call.arg(0), Some("3"));
        assert_eq!(call.arg(1), Some("_"));
        assert_eq!(call.raw_args.as_deref(), Some("3,_"));
    }

    #[test]
    fn test_regex_literal_invocation() {
        let call = FilterInvocation::parse("s/a(b)/c/g");
        assert!(call.is_regex_literal());
        assert_eq!(call.name, "s");
        assert_eq!(call.args, vec!["s/a(b)/c/g"]);
    }

    #[test]
    fn test_slash_inside_call_args_is_not_a_regex_literal() {
        let call = FilterInvocation::parse("onmatch(/x/,y)nomatch(z)");
        assert_eq!(call.form, InvocationForm::Call);
        assert_eq!(call.name, "onmatch");
        assert_eq!(call.args.len(), 4);
    }
}
