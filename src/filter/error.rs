use thiserror::Error;

/// Faults raised while applying a single filter.
///
/// None of these escape the dispatcher: each either degrades to the
/// unmodified input or is rendered inline via [`FilterError::to_annotation`].
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid regex /{pattern}/: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("missing closing delimiter in regex literal '{0}'")]
    MissingDelimiter(String),

    #[error("{message}")]
    Format {
        kind: &'static str,
        message: String,
        format: String,
        value: String,
    },

    #[error("not a number: '{0}'")]
    NotANumber(String),

    #[error("custom filter '{name}' failed: {source}")]
    Custom {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl FilterError {
    /// Bracketed text embedded in the rendered output in place of (or after)
    /// the value.
    pub fn to_annotation(&self) -> String {
        match self {
            FilterError::Regex { pattern, source } => {
                let detail = source
                    .to_string()
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .last()
                    .unwrap_or_default()
                    .to_string();
                format!("[REGEX {pattern} Error: {detail}]")
            }
            FilterError::MissingDelimiter(text) => {
                format!("[REGEX {text} Error: missing closing delimiter]")
            }
            FilterError::Format {
                kind,
                message,
                format,
                value,
            } => format!("[{kind}: {message} \"{format}\",{value}]"),
            other => format!("[{other}]"),
        }
    }
}
