//! Grammar of directive attribute values: definition lists, repeat targets,
//! attribute assignments and content modes.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_till1},
    character::complete::multispace1,
    combinator::{opt, rest, value},
    multi::{fold_many0, separated_list0},
    sequence::terminated,
};
use zpt_tales::DefinitionScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentMode {
    Text,
    Structure,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Definition<'a> {
    pub scope: Option<DefinitionScope>,
    pub target: &'a str,
    pub expression: &'a str,
}

/// One list item up to the next lone `;`, with each `;;` unescaped.
fn list_item(input: &str) -> IResult<&str, String> {
    fold_many0(
        alt((value(";", tag(";;")), is_not(";"))),
        String::new,
        |mut item, part| {
            item.push_str(part);
            item
        },
    )
    .parse(input)
}

/// Splits a `;`-separated directive list. `;;` stands for a literal `;`.
pub(crate) fn split_items(input: &str) -> Vec<String> {
    let items = match separated_list0(tag(";"), list_item).parse(input) {
        Ok((_, items)) => items,
        Err(_) => vec![input.to_string()],
    };
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace).parse(input)
}

fn scope_keyword(input: &str) -> IResult<&str, DefinitionScope> {
    terminated(
        alt((
            value(DefinitionScope::Local, tag("local")),
            value(DefinitionScope::Global, tag("global")),
        )),
        multispace1,
    )
    .parse(input)
}

fn content_mode(input: &str) -> IResult<&str, ContentMode> {
    terminated(
        alt((
            value(ContentMode::Text, tag("text")),
            value(ContentMode::Structure, tag("structure")),
        )),
        multispace1,
    )
    .parse(input)
}

/// `name expression`: a target word followed by a non-empty expression.
fn target_and_expression(input: &str) -> Result<(&str, &str), String> {
    let trimmed = input.trim();
    match (word, multispace1, rest).parse(trimmed) {
        Ok((_, (target, _, expression))) if !expression.trim().is_empty() => Ok((target, expression.trim())),
        _ => Err(format!("expected 'name expression', found '{}'", trimmed)),
    }
}

/// `[local|global] name expression`. A `local:`/`global:` prefix on the
/// name is left in `target` for the caller to resolve.
pub(crate) fn parse_definition(input: &str) -> Result<Definition<'_>, String> {
    let trimmed = input.trim();
    let (remainder, scope) = opt(scope_keyword)
        .parse(trimmed)
        .map_err(|e| e.to_string())?;
    let (target, expression) = target_and_expression(remainder)?;
    Ok(Definition {
        scope,
        target,
        expression,
    })
}

/// `name expression` for `tal:repeat`.
pub(crate) fn parse_repeat(input: &str) -> Result<(&str, &str), String> {
    target_and_expression(input)
}

/// `[prefix:]name expression` for one `tal:attributes` item.
pub(crate) fn parse_attribute_assignment(input: &str) -> Result<(&str, &str), String> {
    let (name, expression) = target_and_expression(input)?;
    if name.starts_with(':') || name.ends_with(':') || name.matches(':').count() > 1 {
        return Err(format!("'{}' is not a valid attribute name", name));
    }
    Ok((name, expression))
}

/// `[text|structure] expression` for `tal:content`, `tal:replace` and `tal:on-error`.
pub(crate) fn parse_content(input: &str) -> Result<(ContentMode, &str), String> {
    let trimmed = input.trim();
    let (expression, mode) = opt(content_mode).parse(trimmed).map_err(|e| e.to_string())?;
    let expression = expression.trim();
    if expression.is_empty() {
        return Err("missing expression".to_string());
    }
    Ok((mode.unwrap_or(ContentMode::Text), expression))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lists_with_escaped_semicolons() {
        assert_eq!(split_items("a x; b y;; z ;"), vec!["a x", "b y; z"]);
        assert_eq!(split_items(" ; "), Vec::<String>::new());
        assert_eq!(split_items("href string:a;;b"), vec!["href string:a;b"]);
        assert_eq!(split_items("a;;;b"), vec!["a;", "b"]);
        assert_eq!(split_items(""), Vec::<String>::new());
    }

    #[test]
    fn definitions() {
        let def = parse_definition("global total here/sum").unwrap();
        assert_eq!(def.scope, Some(DefinitionScope::Global));
        assert_eq!(def.target, "total");
        assert_eq!(def.expression, "here/sum");

        let def = parse_definition("localname string:x y").unwrap();
        assert_eq!(def.scope, None);
        assert_eq!(def.target, "localname");
        assert_eq!(def.expression, "string:x y");

        let def = parse_definition("global:n 1").unwrap();
        assert_eq!(def.target, "global:n");

        assert!(parse_definition("onlyname").is_err());
        assert!(parse_definition("local x").is_err());
    }

    #[test]
    fn content_modes() {
        assert_eq!(parse_content("structure here/html").unwrap(), (ContentMode::Structure, "here/html"));
        assert_eq!(parse_content("text here/t").unwrap(), (ContentMode::Text, "here/t"));
        assert_eq!(parse_content("textual").unwrap(), (ContentMode::Text, "textual"));
        assert!(parse_content("   ").is_err());
    }

    #[test]
    fn attribute_assignments() {
        assert_eq!(parse_attribute_assignment("xlink:href here/url").unwrap(), ("xlink:href", "here/url"));
        assert!(parse_attribute_assignment("a:b:c x").is_err());
        assert!(parse_attribute_assignment("href").is_err());
    }
}
