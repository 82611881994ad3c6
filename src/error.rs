//! Error types for template markup parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::{LexError, TagToken};

/// Byte range in template markup
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Move the error span by `delta` bytes, clamping at zero
    pub(crate) fn shifted(self, delta: isize) -> Self {
        let shift = |at: usize| at.saturating_add_signed(delta);
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => ParseError::Syntax {
                span: shift(span.start)..shift(span.end),
                message,
                expected,
            },
        }
    }

    pub(crate) fn lexing(err: LexError, span: Span) -> Self {
        let message = match err {
            LexError::Unterminated(what) => format!("Unterminated {what}"),
            LexError::UnexpectedInput => "Unexpected character".to_string(),
        };
        ParseError::Syntax {
            span,
            message,
            expected: Vec::new(),
        }
    }

    /// Format the error with markup context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, TagToken>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, TagToken>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of tag".to_string(),
                };
                format!("Unexpected {} in tag", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of tag".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("name '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a tag token for human-readable error messages
fn format_token(tok: &TagToken) -> String {
    match tok {
        TagToken::Word(s) => format!("name '{}'", s),
        TagToken::Quoted(s) => format!("quoted value \"{}\"", s),
        TagToken::Equals => "'='".to_string(),
        TagToken::Slash => "'/'".to_string(),
        TagToken::Space => "whitespace".to_string(),
    }
}
