//! Hole classification
//!
//! Walks the literal fragments with a small markup state machine to find
//! out where each hole sits: between nodes, inside an attribute value, or
//! somewhere a value cannot go. The fragments are joined into the markup
//! that gets parsed, with a comment marker for node holes and the bare
//! marker inside attribute values.

use crate::dom::is_foreign_root;
use crate::parser::lexer::text_mode;
use crate::template::{MARKER, NODE_MARKER};

/// Where a hole was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hole {
    /// Between nodes
    Node,
    /// In the value of attribute `name` on the `element`-th start tag
    Attribute { element: usize, name: String },
    /// A position that cannot hold a value
    Unsupported(&'static str),
}

/// Joined markup plus one [`Hole`] per value index
#[derive(Debug)]
pub struct Scan {
    pub markup: String,
    pub holes: Vec<Hole>,
}

#[derive(Debug)]
enum State {
    Text,
    TagOpen,
    TagName,
    /// Name of the closing element as written so far
    EndTag(String),
    BeforeAttrName,
    AttrName(String),
    AfterAttrName(String),
    BeforeAttrValue(String),
    AttrValue { name: String, quote: Option<char> },
    Comment { dashes: usize },
    Declaration,
    RawText { close: String, matched: usize },
}

struct Scanner {
    state: State,
    /// Start tags seen so far
    elements: usize,
    tag: String,
    /// Open `<svg>`/`<math>` elements around the current position
    foreign: usize,
    /// The last thing inside the current start tag was a `/`
    self_closing: bool,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

impl Scanner {
    fn new(foreign: bool) -> Self {
        Self {
            state: State::Text,
            elements: 0,
            tag: String::new(),
            foreign: usize::from(foreign),
            self_closing: false,
        }
    }

    fn enter_content(&mut self) -> State {
        let self_closing = std::mem::take(&mut self.self_closing);
        if is_foreign_root(&self.tag) {
            if !self_closing {
                self.foreign += 1;
            }
            return State::Text;
        }
        if self.foreign > 0 {
            return State::Text;
        }
        match text_mode(&self.tag) {
            Some(_) => State::RawText {
                close: format!("</{}", self.tag),
                matched: 0,
            },
            None => State::Text,
        }
    }

    fn feed(&mut self, fragment: &str) {
        let mut chars = fragment.char_indices();
        while let Some((i, c)) = chars.next() {
            let state = std::mem::replace(&mut self.state, State::Text);
            self.state = match state {
                State::Text => match c {
                    '<' => State::TagOpen,
                    _ => State::Text,
                },
                State::TagOpen => match c {
                    '!' if fragment[i + 1..].starts_with("--") => {
                        chars.nth(1);
                        State::Comment { dashes: 0 }
                    }
                    '!' | '?' => State::Declaration,
                    '/' => State::EndTag(String::new()),
                    '<' => State::TagOpen,
                    c if c.is_ascii_alphabetic() => {
                        self.elements += 1;
                        self.self_closing = false;
                        self.tag = c.to_ascii_lowercase().to_string();
                        State::TagName
                    }
                    _ => State::Text,
                },
                State::TagName => match c {
                    '>' => self.enter_content(),
                    '/' => {
                        self.self_closing = true;
                        State::BeforeAttrName
                    }
                    c if is_space(c) => State::BeforeAttrName,
                    c => {
                        self.tag.push(c.to_ascii_lowercase());
                        State::TagName
                    }
                },
                State::EndTag(mut name) => match c {
                    '>' => {
                        let name = name.split(|c: char| is_space(c) || c == '/').next().unwrap_or("");
                        if is_foreign_root(name) {
                            self.foreign = self.foreign.saturating_sub(1);
                        }
                        State::Text
                    }
                    c => {
                        name.push(c);
                        State::EndTag(name)
                    }
                },
                State::BeforeAttrName => match c {
                    '>' => self.enter_content(),
                    '/' => {
                        self.self_closing = true;
                        State::BeforeAttrName
                    }
                    c if is_space(c) => State::BeforeAttrName,
                    c => {
                        self.self_closing = false;
                        State::AttrName(c.to_string())
                    }
                },
                State::AttrName(mut name) => match c {
                    '>' => self.enter_content(),
                    '=' => State::BeforeAttrValue(name),
                    '/' => {
                        self.self_closing = true;
                        State::BeforeAttrName
                    }
                    c if is_space(c) => State::AfterAttrName(name),
                    c => {
                        name.push(c);
                        State::AttrName(name)
                    }
                },
                State::AfterAttrName(name) => match c {
                    '>' => self.enter_content(),
                    '=' => State::BeforeAttrValue(name),
                    '/' => {
                        self.self_closing = true;
                        State::BeforeAttrName
                    }
                    c if is_space(c) => State::AfterAttrName(name),
                    c => State::AttrName(c.to_string()),
                },
                State::BeforeAttrValue(name) => match c {
                    '>' => self.enter_content(),
                    '"' | '\'' => State::AttrValue {
                        name,
                        quote: Some(c),
                    },
                    c if is_space(c) => State::BeforeAttrValue(name),
                    _ => State::AttrValue { name, quote: None },
                },
                State::AttrValue {
                    name,
                    quote: Some(q),
                } => {
                    if c == q {
                        State::BeforeAttrName
                    } else {
                        State::AttrValue {
                            name,
                            quote: Some(q),
                        }
                    }
                }
                State::AttrValue { name, quote: None } => match c {
                    '>' => self.enter_content(),
                    c if is_space(c) => State::BeforeAttrName,
                    _ => State::AttrValue { name, quote: None },
                },
                State::Comment { dashes } => match c {
                    '-' => State::Comment { dashes: dashes + 1 },
                    '>' if dashes >= 2 => State::Text,
                    _ => State::Comment { dashes: 0 },
                },
                State::Declaration => match c {
                    '>' => State::Text,
                    _ => State::Declaration,
                },
                State::RawText { close, matched } => {
                    let expected = close.as_bytes()[matched] as char;
                    if c.to_ascii_lowercase() == expected {
                        if matched + 1 == close.len() {
                            State::EndTag(String::new())
                        } else {
                            State::RawText {
                                close,
                                matched: matched + 1,
                            }
                        }
                    } else if c == '<' {
                        State::RawText { close, matched: 1 }
                    } else {
                        State::RawText { close, matched: 0 }
                    }
                }
            };
        }
    }

    /// Classify the hole at the current position and return the markup to emit
    fn hole(&mut self) -> (Hole, &'static str) {
        let element = self.elements.saturating_sub(1);
        let state = std::mem::replace(&mut self.state, State::Text);
        let (hole, emit, next) = match state {
            State::Text | State::TagOpen => (Hole::Node, NODE_MARKER, State::Text),
            State::BeforeAttrValue(name) => (
                Hole::Attribute {
                    element,
                    name: name.clone(),
                },
                MARKER,
                State::AttrValue { name, quote: None },
            ),
            State::AttrValue { name, quote } => (
                Hole::Attribute {
                    element,
                    name: name.clone(),
                },
                MARKER,
                State::AttrValue { name, quote },
            ),
            State::RawText { close, .. } => (
                Hole::Unsupported("raw text element"),
                "",
                State::RawText { close, matched: 0 },
            ),
            state @ State::Comment { .. } => (Hole::Unsupported("comment"), "", state),
            state @ (State::Declaration | State::EndTag(_)) => {
                (Hole::Unsupported("declaration or end tag"), "", state)
            }
            state => (Hole::Unsupported("tag or attribute name"), "", state),
        };
        self.state = next;
        (hole, emit)
    }
}

/// Classify every hole and build the markup to parse
///
/// `foreign` starts the scan inside SVG content, as for `svg` templates.
pub fn scan(fragments: &[String], foreign: bool) -> Scan {
    let mut scanner = Scanner::new(foreign);
    let mut markup = String::new();
    let mut holes = Vec::with_capacity(fragments.len().saturating_sub(1));

    for (i, fragment) in fragments.iter().enumerate() {
        markup.push_str(fragment);
        scanner.feed(fragment);
        if i + 1 < fragments.len() {
            let (hole, emit) = scanner.hole();
            markup.push_str(emit);
            holes.push(hole);
        }
    }

    Scan { markup, holes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_strs(fragments: &[&str]) -> Scan {
        let owned: Vec<String> = fragments.iter().map(|s| s.to_string()).collect();
        scan(&owned, false)
    }

    fn attr(element: usize, name: &str) -> Hole {
        Hole::Attribute {
            element,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_node_holes() {
        let scan = scan_strs(&["<p>", " and ", "</p>"]);
        assert_eq!(scan.holes, vec![Hole::Node, Hole::Node]);
        assert_eq!(
            scan.markup,
            format!("<p>{NODE_MARKER} and {NODE_MARKER}</p>")
        );
    }

    #[test]
    fn test_attribute_holes() {
        let scan = scan_strs(&["<div id=", "><a class=\"x ", " y ", "\" href='", "'>", "</a></div>"]);
        assert_eq!(
            scan.holes,
            vec![
                attr(0, "id"),
                attr(1, "class"),
                attr(1, "class"),
                attr(1, "href"),
                Hole::Node,
            ]
        );
        assert_eq!(
            scan.markup,
            format!(
                "<div id={MARKER}><a class=\"x {MARKER} y {MARKER}\" href='{MARKER}'>{NODE_MARKER}</a></div>"
            )
        );
    }

    #[test]
    fn test_quoted_gt_stays_in_attribute() {
        let scan = scan_strs(&["<a title=\"a>b ", "\">", "</a>"]);
        assert_eq!(scan.holes, vec![attr(0, "title"), Hole::Node]);
    }

    #[test]
    fn test_unsupported_positions() {
        let scan = scan_strs(&["<", "></", ">"]);
        assert_eq!(scan.holes[0], Hole::Node);

        let scan = scan_strs(&["<div ", "></div><!-- ", " -->"]);
        assert_eq!(
            scan.holes,
            vec![
                Hole::Unsupported("tag or attribute name"),
                Hole::Unsupported("comment"),
            ]
        );
        assert_eq!(scan.markup, "<div ></div><!--  -->");
    }

    #[test]
    fn test_raw_text_holes_are_unsupported() {
        let scan = scan_strs(&["<script>var x = ", ";</script><p>", "</p>"]);
        assert_eq!(
            scan.holes,
            vec![Hole::Unsupported("raw text element"), Hole::Node]
        );
    }

    #[test]
    fn test_foreign_title_and_style_take_holes() {
        let scan = scan_strs(&["<svg><title>", "</title><style>", "</style></svg><title>", "</title>"]);
        assert_eq!(
            scan.holes,
            vec![
                Hole::Node,
                Hole::Node,
                Hole::Unsupported("raw text element"),
            ]
        );
    }

    #[test]
    fn test_self_closing_svg_does_not_open_foreign_content() {
        let scan = scan_strs(&["<svg/><title>", "</title>"]);
        assert_eq!(scan.holes, vec![Hole::Unsupported("raw text element")]);
    }

    #[test]
    fn test_svg_templates_start_in_foreign_content() {
        let owned = vec!["<g><title>".to_string(), "</title></g>".to_string()];
        assert_eq!(scan(&owned, true).holes, vec![Hole::Node]);
        assert_eq!(
            scan(&owned, false).holes,
            vec![Hole::Unsupported("raw text element")]
        );
    }

    #[test]
    fn test_comment_then_text() {
        let scan = scan_strs(&["<!-- a -- b --><i>", "</i>"]);
        assert_eq!(scan.holes, vec![Hole::Node]);
    }
}
