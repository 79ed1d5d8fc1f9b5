//! Defines the Abstract Syntax Tree (AST) for TALES expressions.

/// Where a `local:`/`global:`-prefixed name is bound when it names a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionScope {
    Local,
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// A literal name. A dynamic segment (`?name`) resolves `name` first and
    /// uses the resulting text as the segment.
    Standard { name: String, dynamic: bool },
    /// `module:argument`. The argument is the remainder of the whole
    /// expression text and belongs to the module.
    NamespaceOperation { module: String, argument: String },
}

/// One `/`-delimited candidate path.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternateExpression {
    pub segments: Vec<PathSegment>,
}

/// A `|`-separated fallback chain of alternates.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    /// The source text, kept for diagnostics.
    pub text: String,
    pub scope: Option<DefinitionScope>,
    pub alternates: Vec<AlternateExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Literal(String),
    Substitution(PathExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringExpression {
    pub parts: Vec<StringPart>,
}

/// A directive-level expression, after its `path:`/`string:`/`not:`/`exists:` prefix is read.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Path(PathExpression),
    String(StringExpression),
    Not(Box<Expression>),
    Exists(PathExpression),
}
