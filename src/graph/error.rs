use thiserror::Error;

/// Errors raised while turning graph text into a [`super::ParsedGraph`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("[line {line}] Malformed graph: {msg}")]
    Malformed { line: usize, msg: String },

    #[error("[line {line}] Unknown operator: {op}")]
    UnknownOperator { line: usize, op: String },
}

impl ParseError {
    pub fn malformed(line: usize, msg: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            msg: msg.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Malformed { line, .. } | ParseError::UnknownOperator { line, .. } => *line,
        }
    }
}
