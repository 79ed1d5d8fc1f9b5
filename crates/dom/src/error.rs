use crate::node::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, col): (usize, usize)) -> Self {
        Location { line, col }
    }
}

#[derive(Error, Debug, Clone)]
pub enum DomError {
    #[error("Markup error at {location}: {message}")]
    Markup { message: String, location: Location },

    #[error("Unknown entity reference '&{name};' at {location}")]
    UnknownEntity { name: String, location: Location },

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} is not attached to a parent")]
    Detached(NodeId),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Unknown output encoding '{0}'")]
    UnknownEncoding(String),

    #[error("Output cannot be encoded as {encoding}: {message}")]
    Unencodable { encoding: String, message: String },
}

impl From<std::io::Error> for DomError {
    fn from(e: std::io::Error) -> Self {
        DomError::Write(e.to_string())
    }
}
