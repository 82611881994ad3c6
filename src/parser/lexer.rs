//! Lexers for template markup using logos
//!
//! Markup is lexed in two layers. [`Token`] splits a document into text,
//! tags, comments and declarations; each start tag's interior is then lexed
//! again into [`TagToken`]s for the attribute grammar.

use logos::{Lexer, Logos};

use crate::dom::is_foreign_root;
use crate::error::ParseError;
use crate::parser::entities;
use crate::parser::grammar::{self, StartTag};

/// Byte range in template markup
pub type Span = std::ops::Range<usize>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    UnexpectedInput,
    Unterminated(&'static str),
}

/// `<!...>` and `<?...>` constructs
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Doctype(String),
    Bogus(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
pub enum Token {
    #[token("<!--", comment)]
    Comment(String),
    #[regex(r"<[!?]", declaration)]
    Declaration(Declaration),
    #[regex(r"</[a-zA-Z]", end_tag)]
    EndTag(String),
    /// Tag interior without the angle brackets
    #[regex(r"<[a-zA-Z]", start_tag)]
    StartTag(String),
    #[regex(r"[^<]+", |lex| lex.slice().to_string())]
    #[token("<", |lex| lex.slice().to_string())]
    Text(String),
}

/// Tokens inside a start tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
pub enum TagToken {
    #[regex(r"[ \t\r\n\x0C]+")]
    Space,
    #[token("=")]
    Equals,
    #[token("/")]
    Slash,
    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Quoted(String),
    #[regex(r#"[^ \t\r\n\x0C"'=/>]+"#, |lex| lex.slice().to_string())]
    Word(String),
}

fn comment(lex: &mut Lexer<Token>) -> Result<String, LexError> {
    let rest = lex.remainder();
    let end = rest.find("-->").ok_or(LexError::Unterminated("comment"))?;
    lex.bump(end + 3);
    Ok(rest[..end].to_string())
}

fn declaration(lex: &mut Lexer<Token>) -> Result<Declaration, LexError> {
    let opener = lex.slice();
    let rest = lex.remainder();
    let end = rest.find('>').ok_or(LexError::Unterminated("declaration"))?;
    lex.bump(end + 1);
    let body = &rest[..end];
    let doctype = opener == "<!"
        && body
            .get(..7)
            .is_some_and(|head| head.eq_ignore_ascii_case("doctype"));
    Ok(if doctype {
        Declaration::Doctype(body[7..].trim().to_string())
    } else if opener == "<?" {
        Declaration::Bogus(format!("?{body}"))
    } else {
        Declaration::Bogus(body.to_string())
    })
}

fn end_tag(lex: &mut Lexer<Token>) -> Result<String, LexError> {
    let rest = lex.remainder();
    let close = rest.find('>').ok_or(LexError::Unterminated("end tag"))?;
    let mut name = lex.slice()[2..].to_string();
    name.extend(
        rest[..close]
            .chars()
            .take_while(|c| !c.is_ascii_whitespace() && *c != '/'),
    );
    lex.bump(close + 1);
    Ok(name)
}

fn start_tag(lex: &mut Lexer<Token>) -> Result<String, LexError> {
    let rest = lex.remainder();
    let close = tag_close(rest).ok_or(LexError::Unterminated("start tag"))?;
    let interior = format!("{}{}", &lex.slice()[1..], &rest[..close]);
    lex.bump(close + 1);
    Ok(interior)
}

fn unquote(lex: &mut Lexer<TagToken>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

/// Offset of the `>` closing a start tag, skipping quoted attribute values
fn tag_close(rest: &str) -> Option<usize> {
    let mut quote = None;
    let mut after_equals = false;
    for (i, b) in rest.bytes().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'>' => return Some(i),
            b'=' => {
                after_equals = true;
                continue;
            }
            b'"' | b'\'' if after_equals => quote = Some(b),
            b' ' | b'\t' | b'\n' | b'\r' | 0x0c if after_equals => continue,
            _ => {}
        }
        after_equals = false;
    }
    None
}

/// How the content of an element is tokenized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Verbatim until the matching end tag
    Raw,
    /// Verbatim except for character references
    Escapable,
}

/// Elements whose content is not markup
pub fn text_mode(tag: &str) -> Option<TextMode> {
    match tag.to_ascii_lowercase().as_str() {
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            Some(TextMode::Raw)
        }
        "textarea" | "title" => Some(TextMode::Escapable),
        _ => None,
    }
}

/// Offset of `</name` closing a raw text element
fn find_end_tag(rest: &str, name: &str) -> Option<usize> {
    rest.match_indices("</").map(|(at, _)| at).find(|&at| {
        let after = &rest[at + 2..];
        let closes = after
            .get(..name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
        closes
            && after[name.len()..]
                .chars()
                .next()
                .map_or(true, |c| c.is_ascii_whitespace() || c == '/' || c == '>')
    })
}

/// A lexed piece of markup, ready for tree building
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    /// Text with character references already decoded where they apply
    Text(String),
    StartTag(StartTag),
    EndTag(String),
    Comment(String),
    Doctype(String),
}

/// Lex markup into tree-building items, collecting every error
pub fn tokenize(input: &str) -> Result<Vec<(Markup, Span)>, Vec<ParseError>> {
    let mut lexer = Token::lexer(input);
    let mut items = Vec::new();
    let mut errors = Vec::new();
    // Open `<svg>`/`<math>` elements; their content has no raw text elements
    let mut foreign = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(token) => token,
            Err(err) => {
                errors.push(ParseError::lexing(err, span));
                continue;
            }
        };
        match token {
            Token::Text(text) => items.push((Markup::Text(entities::decode(&text)), span)),
            Token::Comment(text) => items.push((Markup::Comment(text), span)),
            Token::Declaration(Declaration::Doctype(name)) => {
                items.push((Markup::Doctype(name), span))
            }
            Token::Declaration(Declaration::Bogus(text)) => {
                items.push((Markup::Comment(text), span))
            }
            Token::EndTag(name) => {
                if is_foreign_root(&name) {
                    foreign = foreign.saturating_sub(1);
                }
                items.push((Markup::EndTag(name), span))
            }
            Token::StartTag(interior) => {
                let tag = match grammar::parse_start_tag(&interior, span.start + 1) {
                    Ok(tag) => tag,
                    Err(errs) => {
                        errors.extend(errs);
                        continue;
                    }
                };
                if is_foreign_root(&tag.name) && !tag.self_closing {
                    foreign += 1;
                }
                let mode = (!tag.self_closing && foreign == 0)
                    .then(|| text_mode(&tag.name))
                    .flatten();
                let name = tag.name.clone();
                let content_start = span.end;
                items.push((Markup::StartTag(tag), span));

                if let Some(mode) = mode {
                    let rest = lexer.remainder();
                    let end = find_end_tag(rest, &name).unwrap_or(rest.len());
                    if end > 0 {
                        let raw = &rest[..end];
                        let text = match mode {
                            TextMode::Raw => raw.to_string(),
                            TextMode::Escapable => entities::decode(raw),
                        };
                        log::trace!(target: "ssr_html::parser", "raw text in <{}>: {} bytes", name, end);
                        items.push((Markup::Text(text), content_start..content_start + end));
                        lexer.bump(end);
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(items)
    } else {
        Err(errors)
    }
}

/// Lex a start tag interior, yielding tokens with spans relative to it
pub fn lex_tag(interior: &str) -> impl Iterator<Item = (Result<TagToken, LexError>, Span)> + '_ {
    TagToken::lexer(interior).spanned()
}
