use thiserror::Error;
use zpt_dom::DomError;
use zpt_tales::TalesError;

#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Could not evaluate {directive}=\"{expression}\" on {element}: {source}")]
    Evaluation {
        directive: String,
        element: String,
        expression: String,
        source: TalesError,
    },

    #[error("Malformed {directive} value '{value}' on {element}: {message}")]
    DirectiveSyntax {
        directive: String,
        element: String,
        value: String,
        message: String,
    },

    #[error("{element} carries both tal:content and tal:replace")]
    ContentAndReplace { element: String },

    #[error("Cannot repeat over {type_name} value of '{expression}' on {element}")]
    NotIterable {
        element: String,
        expression: String,
        type_name: String,
    },

    #[error("{attribute}=\"{expression}\" on {element} does not resolve to a macro")]
    MacroNotFound {
        attribute: String,
        element: String,
        expression: String,
    },

    #[error("Macro chain {chain} {message}")]
    MacroChain { chain: String, message: String },

    #[error("Context visitor '{visitor}' failed: {message}")]
    Visitor { visitor: String, message: String },

    #[error("Tree error: {0}")]
    Dom(#[from] DomError),
}

impl RenderError {
    /// Whether an `on-error` boundary may handle this error. Malformed
    /// directives, expression syntax errors and broken macro chains always
    /// abort the render.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RenderError::Evaluation { source, .. } => !source.is_parse_error(),
            RenderError::DirectiveSyntax { .. }
            | RenderError::ContentAndReplace { .. }
            | RenderError::MacroChain { .. } => false,
            _ => true,
        }
    }

    /// Short name exposed to templates as `error/type`.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Evaluation { .. } => "EvaluationError",
            RenderError::DirectiveSyntax { .. } => "DirectiveSyntaxError",
            RenderError::ContentAndReplace { .. } => "ContentAndReplaceError",
            RenderError::NotIterable { .. } => "NotIterableError",
            RenderError::MacroNotFound { .. } => "MacroNotFoundError",
            RenderError::MacroChain { .. } => "MacroChainError",
            RenderError::Visitor { .. } => "VisitorError",
            RenderError::Dom(_) => "TreeError",
        }
    }
}
