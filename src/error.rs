use thiserror::Error;

/// Fatal problems with a topology document. Anything past this point (dangling
/// link targets, sites without routers) is reported as a layout diagnostic
/// instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("{}", format_parse(.message, .line, .column))]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Invalid topology at `{path}`: {message}")]
    Schema { path: String, message: String },
}

impl LoadError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

fn format_parse(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => {
            format!("Malformed topology document (line {line}, column {column}): {message}")
        }
        _ => format!("Malformed topology document: {message}"),
    }
}
