//! XPath errors.

use tei_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, XPathError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum XPathError {
    #[error("XPath syntax error at {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("Unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Unknown function '{0}()'")]
    UnknownFunction(String),

    #[error("Function {name}() expects {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("Expression does not evaluate to a node-set")]
    NotANodeSet,

    #[error("The {0} axis is not supported")]
    UnsupportedAxis(String),

    #[error("Variable ${0} cannot be resolved; variables are not supported")]
    Variable(String),
}

impl XPathError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        XPathError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Convert to a DiagnosticMessage: T-3-1 for syntax, T-3-2 otherwise.
    pub fn to_diagnostic(&self, expression: &str) -> DiagnosticMessage {
        match self {
            XPathError::Syntax { message, position } => {
                DiagnosticMessageBuilder::error("XPath Syntax Error")
                    .with_code("T-3-1")
                    .problem(format!("Could not parse `{}`", expression))
                    .add_detail(format!("{} at character {}", message, position))
                    .build()
            }
            other => DiagnosticMessageBuilder::error("XPath Evaluation Error")
                .with_code("T-3-2")
                .problem(format!("Could not evaluate `{}`", expression))
                .add_detail(other.to_string())
                .build(),
        }
    }
}
