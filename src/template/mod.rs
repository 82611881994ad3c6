//! Tagged templates
//!
//! A template is written as literal markup fragments with value holes
//! between them. The fragments of one call site form a [`TemplateStrings`]
//! whose identity is stable across renders, which lets the cache skip
//! compilation after the first render.
//!
//! # Example
//!
//! ```
//! use ssr_html::{html, Renderer};
//!
//! let name = "world";
//! let page = html!("<p class=\"greeting\">Hello, " {name} "!</p>");
//! let out = Renderer::default().render(page).unwrap();
//! assert_eq!(out, "<p class=\"greeting\">Hello, world!</p>");
//! ```

mod cache;
mod compile;
mod instance;
pub(crate) mod scanner;

pub use cache::{CacheStats, TemplateCache};
pub use compile::{AttributeStrings, Template, TemplatePart, TemplatePartKind};
pub use instance::TemplateInstance;

use std::fmt;
use std::rc::{Rc, Weak};

use crate::value::Value;

/// Placeholder substituted for each hole before parsing
pub const MARKER: &str = "{{ssr-hole}}";

/// A node hole as it appears in the joined markup
pub(crate) const NODE_MARKER: &str = "<!--{{ssr-hole}}-->";

/// Which parser a template is compiled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// HTML content; a full document when it starts with a doctype or `<html>`
    Html,
    /// SVG content, parsed as foreign elements
    Svg,
}

/// The literal fragments of a template, shared by every render of one call site
///
/// Holds one more fragment than the template has holes. Clones share the
/// same allocation and compare identical under [`TemplateStrings::ptr_eq`].
#[derive(Clone)]
pub struct TemplateStrings(Rc<[String]>);

impl TemplateStrings {
    /// Create a new identity from fragments
    ///
    /// An empty list is treated as a single empty fragment.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        if fragments.is_empty() {
            fragments.push(String::new());
        }
        Self(fragments.into())
    }

    pub fn from_static(fragments: &[&'static str]) -> Self {
        Self::new(fragments.iter().copied())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of holes between the fragments
    pub fn hole_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Fragments joined with [`MARKER`], the content key of this template
    pub fn joined(&self) -> String {
        self.0.join(MARKER)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const String as usize
    }

    pub(crate) fn downgrade(&self) -> Weak<[String]> {
        Rc::downgrade(&self.0)
    }
}

impl fmt::Debug for TemplateStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// One evaluation of a template: its fragments plus the values for this render
#[derive(Debug, Clone)]
pub struct TemplateResult {
    strings: TemplateStrings,
    values: Vec<Value>,
    kind: TemplateKind,
}

impl TemplateResult {
    pub fn new(strings: TemplateStrings, values: Vec<Value>, kind: TemplateKind) -> Self {
        Self {
            strings,
            values,
            kind,
        }
    }

    pub fn html(strings: TemplateStrings, values: Vec<Value>) -> Self {
        Self::new(strings, values, TemplateKind::Html)
    }

    pub fn svg(strings: TemplateStrings, values: Vec<Value>) -> Self {
        Self::new(strings, values, TemplateKind::Svg)
    }

    pub fn strings(&self) -> &TemplateStrings {
        &self.strings
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __template {
    (@munch $kind:expr; [$($done:expr,)*] [$($cur:literal)*] [$($val:expr,)*] { $next:expr } $($rest:tt)*) => {
        $crate::__template!(@munch $kind; [$($done,)* concat!("" $(, $cur)*),] [] [$($val,)* $next,] $($rest)*)
    };
    (@munch $kind:expr; [$($done:expr,)*] [$($cur:literal)*] [$($val:expr,)*] $lit:literal $($rest:tt)*) => {
        $crate::__template!(@munch $kind; [$($done,)*] [$($cur)* $lit] [$($val,)*] $($rest)*)
    };
    (@munch $kind:expr; [$($done:expr,)*] [$($cur:literal)*] [$($val:expr,)*]) => {{
        ::std::thread_local! {
            static STRINGS: $crate::TemplateStrings =
                $crate::TemplateStrings::from_static(&[$($done,)* concat!("" $(, $cur)*)]);
        }
        $crate::TemplateResult::new(
            STRINGS.with(::std::clone::Clone::clone),
            ::std::vec![$($crate::Value::from($val)),*],
            $kind,
        )
    }};
}

/// Build an HTML [`TemplateResult`]
///
/// Literal fragments are written as string literals and values as braced
/// expressions. Adjacent literals are concatenated. Every expansion site
/// owns one [`TemplateStrings`], so repeated evaluations of the same call
/// site share a compiled template.
///
/// ```
/// use ssr_html::html;
///
/// let items = vec!["a", "b"];
/// let t = html!("<ul class=" {"list"} ">" {items} "</ul>");
/// assert_eq!(t.strings().hole_count(), 2);
/// ```
#[macro_export]
macro_rules! html {
    ($($body:tt)*) => {
        $crate::__template!(@munch $crate::TemplateKind::Html; [] [] [] $($body)*)
    };
}

/// Build an SVG [`TemplateResult`], see [`html!`]
#[macro_export]
macro_rules! svg {
    ($($body:tt)*) => {
        $crate::__template!(@munch $crate::TemplateKind::Svg; [] [] [] $($body)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting(name: &str) -> TemplateResult {
        crate::html!("<p>" {name} "</p>")
    }

    #[test]
    fn test_macro_splits_fragments() {
        let t = crate::html!("<a href=\"" {"/x"} "\">" "link" "</a>");
        assert_eq!(t.strings().as_slice(), &["<a href=\"", "\">link</a>"]);
        assert_eq!(t.values().len(), 1);
        assert_eq!(t.kind(), TemplateKind::Html);
    }

    #[test]
    fn test_macro_call_site_identity() {
        let a = greeting("a");
        let b = greeting("b");
        assert!(a.strings().ptr_eq(b.strings()));

        let other = crate::html!("<p>" {"a"} "</p>");
        assert!(!a.strings().ptr_eq(other.strings()));
        assert_eq!(a.strings().joined(), other.strings().joined());
    }

    #[test]
    fn test_macro_leading_and_trailing_holes() {
        let t = crate::svg!({1} {2});
        assert_eq!(t.strings().as_slice(), &["", "", ""]);
        assert_eq!(t.kind(), TemplateKind::Svg);
    }

    #[test]
    fn test_empty_template() {
        let t = crate::html!();
        assert_eq!(t.strings().as_slice(), &[""]);
        assert_eq!(t.strings().hole_count(), 0);
    }

    #[test]
    fn test_joined_uses_marker() {
        let strings = TemplateStrings::new(["<b>", "</b>"]);
        assert_eq!(strings.joined(), format!("<b>{MARKER}</b>"));
        assert_eq!(TemplateStrings::new(Vec::<String>::new()).hole_count(), 0);
    }
}
