//! Helpers that build common hole values

use crate::error::ParseError;
use crate::value::{Deferred, Fragment, Value};

/// Parse markup into nodes that are inserted as-is rather than as escaped text
///
/// Only use this with trusted markup.
pub fn unsafe_html(markup: &str) -> Result<Value, Vec<ParseError>> {
    Fragment::parse(markup).map(Value::Node)
}

/// Join the names whose flag is set, for a `class` attribute
pub fn class_map<I, S>(classes: I) -> Value
where
    I: IntoIterator<Item = (S, bool)>,
    S: AsRef<str>,
{
    let names = classes
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.as_ref().to_string())
        .collect::<Vec<_>>();
    Value::from(names.join(" "))
}

/// Write declarations as `prop: value;`, for a `style` attribute
///
/// Pairs with an empty value are left out.
pub fn style_map<I, P, V>(declarations: I) -> Value
where
    I: IntoIterator<Item = (P, V)>,
    P: AsRef<str>,
    V: AsRef<str>,
{
    let style = declarations
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(prop, value)| format!("{}: {};", prop.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join(" ");
    Value::from(style)
}

/// Set an attribute only when there is a value
///
/// `None` leaves the attribute out of the element, even when other holes
/// share it. Between nodes it renders nothing.
pub fn if_defined<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Absent, Into::into)
}

/// Show `placeholder` until `pending` settles
///
/// An already fulfilled deferred renders its value right away. A rejection
/// leaves the placeholder in place.
pub fn until(pending: Deferred, placeholder: impl Into<Value>) -> Value {
    Value::Until {
        pending,
        placeholder: Box::new(placeholder.into()),
    }
}

/// Map each item to a value and render them in order
///
/// Items are matched by position on re-render; a reordered list updates
/// every position that changed instead of moving nodes.
pub fn repeat<I, F, V>(items: I, f: F) -> Value
where
    I: IntoIterator,
    F: FnMut(I::Item) -> V,
    V: Into<Value>,
{
    Value::iter(items.into_iter().map(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::deferred;
    use crate::{html, render_once, Renderer, SerializeConfig, TemplateResult};
    use pretty_assertions::assert_eq;

    fn item(label: &str) -> TemplateResult {
        html!("<li>" {label} "</li>")
    }

    #[test]
    fn test_unsafe_html_inserts_nodes() {
        let raw = unsafe_html("<em>hi</em> &amp; bye").unwrap();
        let out = render_once(html!("<p>" {raw} "</p>")).unwrap();
        assert_eq!(out, "<p><em>hi</em> &amp; bye</p>");

        let escaped = render_once(html!("<p>" {"<em>hi</em>"} "</p>")).unwrap();
        assert_eq!(escaped, "<p>&lt;em&gt;hi&lt;/em&gt;</p>");
    }

    #[test]
    fn test_unsafe_html_reports_errors() {
        assert!(unsafe_html("<p><!-- open").is_err());
    }

    #[test]
    fn test_class_map() {
        let classes = class_map([("active", true), ("hidden", false), ("wide", true)]);
        let out = render_once(html!("<div class=" {classes} "></div>")).unwrap();
        assert_eq!(out, "<div class=\"active wide\"></div>");
    }

    #[test]
    fn test_style_map() {
        let style = style_map([("color", "red"), ("margin", ""), ("font-size", "2em")]);
        let out = render_once(html!("<p style=\"" {style} "\"></p>")).unwrap();
        assert_eq!(out, "<p style=\"color: red; font-size: 2em;\"></p>");
    }

    #[test]
    fn test_repeat() {
        let list = repeat(["a", "b", "c"], item);
        let out = render_once(html!("<ul>" {list} "</ul>")).unwrap();
        assert_eq!(out, "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn test_if_defined() {
        let out = render_once(html!("<img alt=" {if_defined(Some("logo"))} ">")).unwrap();
        assert_eq!(out, "<img alt=\"logo\">");

        let out = render_once(html!("<img alt=" {if_defined(None::<&str>)} ">")).unwrap();
        assert_eq!(out, "<img>");

        let out = render_once(html!("<a href=\"/u/" {if_defined(None::<u32>)} "\">x</a>")).unwrap();
        assert_eq!(out, "<a>x</a>");

        let out = render_once(html!("<p>" {if_defined(None::<&str>)} "</p>")).unwrap();
        assert_eq!(out, "<p></p>");
    }

    #[test]
    fn test_if_defined_toggles_on_rerender() {
        fn image(alt: Option<&str>) -> TemplateResult {
            html!("<img src=\"a.png\" alt=" {if_defined(alt)} ">")
        }
        let mut renderer = Renderer::default();
        let config = SerializeConfig::default();
        let mut root = renderer.render_root(image(Some("a"))).unwrap();
        assert_eq!(root.to_html(&config), "<img src=\"a.png\" alt=\"a\">");

        root.render(&mut renderer, image(None)).unwrap();
        assert_eq!(root.to_html(&config), "<img src=\"a.png\">");

        root.render(&mut renderer, image(Some("b"))).unwrap();
        assert_eq!(root.to_html(&config), "<img src=\"a.png\" alt=\"b\">");
    }

    #[test]
    fn test_until_shows_placeholder_then_value() {
        fn status(value: Value) -> TemplateResult {
            html!("<p>" {value} "</p>")
        }
        let mut renderer = Renderer::default();
        let config = SerializeConfig::default();
        let (resolver, pending) = deferred();
        let mut root = renderer
            .render_root(status(until(pending.clone(), item("loading"))))
            .unwrap();
        assert_eq!(root.to_html(&config), "<p><li>loading</li></p>");

        root.render(&mut renderer, status(until(pending.clone(), "ignored")))
            .unwrap();
        assert_eq!(root.to_html(&config), "<p><li>loading</li></p>");

        resolver.resolve("ready");
        assert_eq!(root.flush(&mut renderer).unwrap().resolved, 1);
        assert_eq!(root.to_html(&config), "<p>ready</p>");

        root.render(&mut renderer, status(until(pending, "loading")))
            .unwrap();
        assert_eq!(root.to_html(&config), "<p>ready</p>");
    }

    #[test]
    fn test_until_rejection_keeps_placeholder() {
        let mut renderer = Renderer::default();
        let (resolver, pending) = deferred();
        let mut root = renderer
            .render_root(html!("<p>" {until(pending, "loading")} "</p>"))
            .unwrap();
        drop(resolver);
        assert_eq!(root.flush(&mut renderer).unwrap().rejected, 1);
        assert_eq!(root.to_html(&SerializeConfig::default()), "<p>loading</p>");
    }
}
