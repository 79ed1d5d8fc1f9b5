//! A `nom`-based parser for TALES path and string expressions.

use super::ast::*;
use crate::error::TalesError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::{char, multispace0},
    combinator::{cut, map, opt, rest, value},
    multi::{many0, separated_list1},
    sequence::{preceded, separated_pair, terminated},
};

// --- Main Public Parsers ---

/// Parses a directive value, honouring the `path:`, `string:`, `not:` and
/// `exists:` prefixes. Anything else is a path expression.
pub fn parse_expression(input: &str) -> Result<Expression, TalesError> {
    let trimmed = input.trim_start();
    let (body, prefix) = match opt(expression_prefix).parse(trimmed) {
        Ok(parsed) => parsed,
        Err(e) => return Err(parse_error(input, e.to_string())),
    };
    match prefix {
        Some(ExpressionPrefix::String) => Ok(Expression::String(parse_string_expression(body)?)),
        Some(ExpressionPrefix::Not) => Ok(Expression::Not(Box::new(parse_expression(body)?))),
        Some(ExpressionPrefix::Exists) => Ok(Expression::Exists(parse_path_expression(body)?)),
        Some(ExpressionPrefix::Path) | None => Ok(Expression::Path(parse_path_expression(body)?)),
    }
}

pub fn parse_path_expression(input: &str) -> Result<PathExpression, TalesError> {
    let text = input.trim();
    let (body, scope) = match opt(definition_scope).parse(text) {
        Ok(parsed) => parsed,
        Err(e) => return Err(parse_error(text, e.to_string())),
    };
    if body.trim().is_empty() {
        return Err(parse_error(text, "empty path expression"));
    }

    let alternates = match separated_list1(char('|'), alternate).parse(body) {
        Ok(("", alternates)) => alternates,
        Ok((rem, _)) => {
            return Err(parse_error(
                text,
                format!("Parser did not consume all input. Remainder: '{}'", rem),
            ));
        }
        Err(e) => return Err(parse_error(text, e.to_string())),
    };

    let alternates = alternates
        .into_iter()
        .map(|raw| validate_alternate(text, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PathExpression {
        text: text.to_string(),
        scope,
        alternates,
    })
}

/// Parses literal text with `$name` and `${path}` substitutions. `$$` is a literal `$`.
pub fn parse_string_expression(input: &str) -> Result<StringExpression, TalesError> {
    let raw_parts = match many0(string_part).parse(input) {
        Ok(("", parts)) => parts,
        Ok((rem, _)) => {
            return Err(parse_error(
                input,
                format!("Parser did not consume all input. Remainder: '{}'", rem),
            ));
        }
        Err(e) => return Err(parse_error(input, e.to_string())),
    };

    let mut parts: Vec<StringPart> = Vec::new();
    for raw in raw_parts {
        match raw {
            RawStringPart::Literal(text) => match parts.last_mut() {
                Some(StringPart::Literal(existing)) => existing.push_str(text),
                _ => parts.push(StringPart::Literal(text.to_string())),
            },
            RawStringPart::Substitution(path) => {
                parts.push(StringPart::Substitution(parse_path_expression(path)?));
            }
        }
    }
    Ok(StringExpression { parts })
}

/// Splits a definition target such as `global:counter` into its scope and name.
pub fn parse_definition_target(input: &str) -> Result<(Option<DefinitionScope>, String), TalesError> {
    let text = input.trim();
    let (name, scope) = match opt(definition_scope).parse(text) {
        Ok(parsed) => parsed,
        Err(e) => return Err(parse_error(text, e.to_string())),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(parse_error(text, "expected a single variable name"));
    }
    Ok((scope, name.to_string()))
}

fn parse_error(expression: &str, message: impl Into<String>) -> TalesError {
    TalesError::Parse {
        expression: expression.to_string(),
        message: message.into(),
    }
}

// --- Prefixes ---

#[derive(Debug, Clone, Copy)]
enum ExpressionPrefix {
    Path,
    String,
    Not,
    Exists,
}

fn expression_prefix(input: &str) -> IResult<&str, ExpressionPrefix> {
    alt((
        value(ExpressionPrefix::String, tag("string:")),
        value(ExpressionPrefix::Path, tag("path:")),
        value(ExpressionPrefix::Not, tag("not:")),
        value(ExpressionPrefix::Exists, tag("exists:")),
    ))
    .parse(input)
}

fn definition_scope(input: &str) -> IResult<&str, DefinitionScope> {
    alt((
        value(DefinitionScope::Local, tag("local:")),
        value(DefinitionScope::Global, tag("global:")),
    ))
    .parse(input)
}

// --- Path Grammar ---

#[derive(Debug)]
enum RawSegment<'a> {
    Standard(&'a str),
    Operation(&'a str, &'a str),
}

fn is_module_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// `module:argument`; the argument swallows the rest of the input, including `/` and `|`.
fn namespace_operation(input: &str) -> IResult<&str, RawSegment<'_>> {
    map(
        separated_pair(take_while1(is_module_char), char(':'), rest),
        |(module, argument)| RawSegment::Operation(module, argument),
    )
    .parse(input)
}

fn standard_segment(input: &str) -> IResult<&str, RawSegment<'_>> {
    map(take_till(|c| c == '/' || c == '|'), RawSegment::Standard).parse(input)
}

fn segment(input: &str) -> IResult<&str, RawSegment<'_>> {
    preceded(multispace0, alt((namespace_operation, standard_segment))).parse(input)
}

fn alternate(input: &str) -> IResult<&str, Vec<RawSegment<'_>>> {
    separated_list1(char('/'), segment).parse(input)
}

fn validate_alternate(text: &str, raw: Vec<RawSegment<'_>>) -> Result<AlternateExpression, TalesError> {
    let mut segments = Vec::with_capacity(raw.len());
    for (position, raw_segment) in raw.into_iter().enumerate() {
        let segment = match raw_segment {
            RawSegment::Operation(module, argument) => PathSegment::NamespaceOperation {
                module: module.trim().to_string(),
                argument: argument.to_string(),
            },
            RawSegment::Standard(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(parse_error(text, "empty path segment"));
                }
                match name.strip_prefix('?') {
                    Some(_) if position == 0 => {
                        return Err(parse_error(
                            text,
                            "a dynamic segment cannot start an alternate",
                        ));
                    }
                    Some("") => return Err(parse_error(text, "dynamic segment has no name")),
                    Some(inner) => PathSegment::Standard {
                        name: inner.to_string(),
                        dynamic: true,
                    },
                    None => PathSegment::Standard {
                        name: name.to_string(),
                        dynamic: false,
                    },
                }
            }
        };
        segments.push(segment);
    }
    Ok(AlternateExpression { segments })
}

// --- String Grammar ---

#[derive(Debug, Clone)]
enum RawStringPart<'a> {
    Literal(&'a str),
    Substitution(&'a str),
}

fn is_short_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}

fn string_part(input: &str) -> IResult<&str, RawStringPart<'_>> {
    alt((
        value(RawStringPart::Literal("$"), tag("$$")),
        map(
            preceded(tag("${"), cut(terminated(take_till(|c| c == '}'), char('}')))),
            RawStringPart::Substitution,
        ),
        map(
            preceded(char('$'), take_while1(is_short_path_char)),
            RawStringPart::Substitution,
        ),
        map(take_till1(|c| c == '$'), RawStringPart::Literal),
        value(RawStringPart::Literal("$"), char('$')),
    ))
    .parse(input)
}
