//! Start tag grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::dom::Attribute;
use crate::error::ParseError;
use crate::parser::entities;
use crate::parser::lexer::{lex_tag, LexError, TagToken};

/// A parsed start tag, names as written
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

#[derive(Debug, Clone)]
enum TagItem {
    Space,
    Slash,
    Attribute(String, String),
}

/// Parse the interior of a start tag; `offset` is where it begins in the markup
pub fn parse_start_tag(interior: &str, offset: usize) -> Result<StartTag, Vec<ParseError>> {
    let len = interior.len();
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (token, span) in lex_tag(interior) {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(err) => {
                let err = match &interior[span.clone()] {
                    s if s.starts_with(&['"', '\''][..]) => LexError::Unterminated("quoted value"),
                    _ => err,
                };
                errors.push(ParseError::lexing(err, span));
            }
        }
    }
    if !errors.is_empty() {
        return Err(rebase(errors, offset));
    }

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (TagToken, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    start_tag_parser()
        .parse(token_stream)
        .into_result()
        .map(|(name, items)| assemble(name, items))
        .map_err(|errs| rebase(errs.into_iter().map(ParseError::from).collect(), offset))
}

fn rebase(errors: Vec<ParseError>, offset: usize) -> Vec<ParseError> {
    errors
        .into_iter()
        .map(|e| e.shifted(offset as isize))
        .collect()
}

fn assemble(name: String, items: Vec<TagItem>) -> StartTag {
    let self_closing = matches!(
        items.iter().rev().find(|i| !matches!(i, TagItem::Space)),
        Some(TagItem::Slash)
    );
    let attributes = items
        .into_iter()
        .filter_map(|item| match item {
            TagItem::Attribute(name, value) => Some(Attribute::new(name, entities::decode(&value))),
            _ => None,
        })
        .collect();
    StartTag {
        name,
        attributes,
        self_closing,
    }
}

fn start_tag_parser<'a, I>(
) -> impl Parser<'a, I, (String, Vec<TagItem>), extra::Err<Rich<'a, TagToken>>> + Clone
where
    I: ValueInput<'a, Token = TagToken, Span = SimpleSpan>,
{
    let space = just(TagToken::Space).repeated();

    let word = select! {
        TagToken::Word(w) => w,
    };

    let quoted = select! {
        TagToken::Quoted(q) => q,
    };

    // Unquoted values run until whitespace and may contain '/' and '='
    let unquoted = select! {
        TagToken::Word(w) => w,
        TagToken::Slash => "/".to_string(),
        TagToken::Equals => "=".to_string(),
    }
    .repeated()
    .at_least(1)
    .collect::<Vec<String>>()
    .map(|pieces| pieces.concat());

    let value = choice((quoted, unquoted));

    let attribute = word
        .clone()
        .then(
            space
                .clone()
                .ignore_then(just(TagToken::Equals))
                .ignore_then(space)
                .ignore_then(value)
                .or_not(),
        )
        .map(|(name, value)| TagItem::Attribute(name, value.unwrap_or_default()));

    let item = choice((
        just(TagToken::Space).to(TagItem::Space),
        just(TagToken::Slash).to(TagItem::Slash),
        attribute,
    ));

    word.then(item.repeated().collect::<Vec<_>>())
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_bare_tag() {
        let tag = parse_start_tag("div", 0).unwrap();
        assert_eq!(tag.name, "div");
        assert!(tag.attributes.is_empty());
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_parse_attribute_forms() {
        let tag = parse_start_tag("a href='/x?a=1' id=main hidden data-x = \"y\"", 0).unwrap();
        assert_eq!(
            tag.attributes,
            vec![
                Attribute::new("href", "/x?a=1"),
                Attribute::new("id", "main"),
                Attribute::new("hidden", ""),
                Attribute::new("data-x", "y"),
            ]
        );
    }

    #[test]
    fn test_unquoted_value_keeps_slashes() {
        let tag = parse_start_tag("a href=/path/to", 0).unwrap();
        assert_eq!(tag.attributes, vec![Attribute::new("href", "/path/to")]);
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_self_closing() {
        assert!(parse_start_tag("circle r=\"4\" /", 0).unwrap().self_closing);
        assert!(parse_start_tag("path/", 0).unwrap().self_closing);
    }

    #[test]
    fn test_attribute_values_are_decoded() {
        let tag = parse_start_tag("p title=\"a &amp; b\"", 0).unwrap();
        assert_eq!(tag.attributes[0].value, "a & b");
    }

    #[test]
    fn test_unterminated_quote_reports_offset_span() {
        let errors = parse_start_tag("p title=\"oops", 10).unwrap_err();
        assert!(!errors.is_empty());
        assert_eq!(errors[0].span().start, 18);
    }
}
