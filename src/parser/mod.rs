//! HTML markup parser producing detached [`Tree`]s

pub mod builder;
pub mod entities;
mod grammar;
pub mod lexer;

pub use grammar::{parse_start_tag, StartTag};

use crate::dom::{NodeId, NodeKind, Tree};
use crate::error::ParseError;

const SVG_OPEN: &str = "<svg>";
const SVG_CLOSE: &str = "</svg>";

/// Parse markup into the children of `parent`
pub fn parse_into(tree: &mut Tree, parent: NodeId, markup: &str) -> Result<(), Vec<ParseError>> {
    let items = lexer::tokenize(markup)?;
    builder::build(tree, parent, items);
    Ok(())
}

/// Parse markup as a fragment rooted at a [`NodeKind::Fragment`] node
pub fn parse_fragment(markup: &str) -> Result<(Tree, NodeId), Vec<ParseError>> {
    parse_rooted(markup, NodeKind::Fragment)
}

/// Parse markup as a full document rooted at a [`NodeKind::Document`] node
pub fn parse_document(markup: &str) -> Result<(Tree, NodeId), Vec<ParseError>> {
    parse_rooted(markup, NodeKind::Document)
}

fn parse_rooted(markup: &str, kind: NodeKind) -> Result<(Tree, NodeId), Vec<ParseError>> {
    let mut tree = Tree::new();
    let root = tree.create(kind);
    parse_into(&mut tree, root, markup)?;
    Ok((tree, root))
}

/// Parse SVG content as a fragment
///
/// The markup is parsed inside an `<svg>` wrapper so it is treated as
/// foreign content; the wrapper is removed again and its children become
/// the fragment's children. Error spans refer to the unwrapped markup.
pub fn parse_svg_fragment(markup: &str) -> Result<(Tree, NodeId), Vec<ParseError>> {
    let wrapped = format!("{SVG_OPEN}{markup}{SVG_CLOSE}");
    let (mut tree, root) = parse_fragment(&wrapped).map_err(|errors| {
        errors
            .into_iter()
            .map(|e| e.shifted(-(SVG_OPEN.len() as isize)))
            .collect::<Vec<_>>()
    })?;
    let wrapper = tree
        .children(root)
        .iter()
        .copied()
        .find(|&n| tree.element_name(n) == Some("svg"));
    if let Some(wrapper) = wrapper {
        tree.move_children(wrapper, root, Some(wrapper));
        tree.remove(wrapper);
    }
    Ok((tree, root))
}

/// Check if markup starts like a complete document
///
/// True when, after leading whitespace and comments, it opens with a
/// doctype or an `<html` tag.
pub fn looks_like_document(markup: &str) -> bool {
    let mut rest = markup.trim_start();
    while let Some(after) = rest.strip_prefix("<!--") {
        match after.find("-->") {
            Some(end) => rest = after[end + 3..].trim_start(),
            None => return false,
        }
    }
    let starts_with = |prefix: &str| {
        rest.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    if starts_with("<!doctype") {
        return true;
    }
    starts_with("<html")
        && rest[5..]
            .chars()
            .next()
            .map_or(true, |c| c.is_ascii_whitespace() || c == '>' || c == '/')
}
