//! Re-rendering into a live tree: what is patched and what is left alone

use std::rc::Rc;

use pretty_assertions::assert_eq;
use ssr_html::dom::NodeId;
use ssr_html::part::{NodePart, Part};
use ssr_html::{deferred, html, Deferred, FlushReport, RenderRoot, Renderer, SerializeConfig, TemplateResult, Value};

fn paragraph(v: impl Into<Value>) -> TemplateResult {
    let v: Value = v.into();
    html!("<p>" {v} "</p>")
}

fn list(items: Vec<i32>) -> TemplateResult {
    html!("<ul>" {items} "</ul>")
}

fn card(body: TemplateResult) -> TemplateResult {
    html!("<div>" {body} "</div>")
}

fn label(text: &str) -> TemplateResult {
    html!("<span>" {text} "</span>")
}

fn emphasis(text: &str) -> TemplateResult {
    html!("<em>" {text} "</em>")
}

fn link(href: &str) -> TemplateResult {
    html!("<a href=" {href} ">go</a>")
}

fn pair(a: Deferred, b: Deferred) -> TemplateResult {
    html!("<p>" {a} "</p><p>" {b} "</p>")
}

fn html_of(root: &RenderRoot) -> String {
    root.to_html(&SerializeConfig::default())
}

fn node_part(root: &RenderRoot, index: usize) -> &NodePart {
    match &root.instance().parts()[index] {
        Part::Node(part) => part,
        Part::Attribute(_) => panic!("expected a node part at {index}"),
    }
}

fn children_of(root: &RenderRoot, name: &str) -> Vec<NodeId> {
    let tree = root.tree();
    let element = tree.find_element(root.root(), name).expect("element should exist");
    tree.children(element).to_vec()
}

#[test]
fn test_text_is_mutated_in_place() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph("x")).unwrap();
    let text = children_of(&root, "p")[1];
    assert_eq!(root.tree().text(text), Some("x"));

    root.render(&mut renderer, paragraph("y")).unwrap();
    assert_eq!(children_of(&root, "p")[1], text);
    assert_eq!(root.tree().text(text), Some("y"));
    assert_eq!(html_of(&root), "<p>y</p>");
}

#[test]
fn test_unchanged_primitive_is_noop() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph(42)).unwrap();
    let mutations = root.tree().mutations();
    let nodes = root.tree().len();

    root.render(&mut renderer, paragraph(42)).unwrap();
    assert_eq!(root.tree().mutations(), mutations);
    assert_eq!(root.tree().len(), nodes);
}

#[test]
fn test_unchanged_attribute_is_noop() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(link("/a")).unwrap();
    let mutations = root.tree().mutations();

    root.render(&mut renderer, link("/a")).unwrap();
    assert_eq!(root.tree().mutations(), mutations);

    root.render(&mut renderer, link("/b")).unwrap();
    assert_eq!(html_of(&root), "<a href=\"/b\">go</a>");
}

#[test]
fn test_list_growth_appends_one_region() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(list(vec![1, 2])).unwrap();
    let before = children_of(&root, "ul");
    let nodes = root.tree().len();

    root.render(&mut renderer, list(vec![1, 2, 3])).unwrap();
    let after = children_of(&root, "ul");

    // One separator and one text node, existing items untouched
    assert_eq!(root.tree().len(), nodes + 2);
    assert_eq!(after.len(), before.len() + 2);
    assert_eq!(&after[..4], &before[..4]);
    assert_eq!(node_part(&root, 0).items().map(<[_]>::len), Some(3));
    assert_eq!(html_of(&root), "<ul>123</ul>");
}

#[test]
fn test_list_shrink_reattaches_end() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(list(vec![1, 2, 3])).unwrap();
    let nodes = root.tree().len();
    let first = children_of(&root, "ul")[1];

    root.render(&mut renderer, list(vec![1])).unwrap();
    assert_eq!(root.tree().len(), nodes - 4);
    assert_eq!(children_of(&root, "ul")[1], first);

    let part = node_part(&root, 0);
    let items = part.items().expect("still an iterable");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].end(), part.end());
    assert_eq!(html_of(&root), "<ul>1</ul>");

    root.render(&mut renderer, list(vec![1, 5])).unwrap();
    assert_eq!(html_of(&root), "<ul>15</ul>");
}

#[test]
fn test_list_to_empty_and_back() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(list(vec![1, 2])).unwrap();

    root.render(&mut renderer, list(vec![])).unwrap();
    assert_eq!(html_of(&root), "<ul></ul>");
    assert!(node_part(&root, 0).items().is_none());

    root.render(&mut renderer, list(vec![7])).unwrap();
    assert_eq!(html_of(&root), "<ul>7</ul>");
}

#[test]
fn test_nested_instance_is_reused() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(card(label("a"))).unwrap();
    assert_eq!(html_of(&root), "<div><span>a</span></div>");

    let span = root.tree().find_element(root.root(), "span").unwrap();
    let template = Rc::clone(node_part(&root, 0).instance().unwrap().template());

    root.render(&mut renderer, card(label("b"))).unwrap();
    assert_eq!(html_of(&root), "<div><span>b</span></div>");
    assert_eq!(root.tree().find_element(root.root(), "span"), Some(span));
    assert!(Rc::ptr_eq(node_part(&root, 0).instance().unwrap().template(), &template));
}

#[test]
fn test_different_nested_template_replaces_region() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(card(label("a"))).unwrap();

    root.render(&mut renderer, card(emphasis("c"))).unwrap();
    assert_eq!(html_of(&root), "<div><em>c</em></div>");
    assert!(root.tree().find_element(root.root(), "span").is_none());

    root.render(&mut renderer, card(label("d"))).unwrap();
    assert_eq!(html_of(&root), "<div><span>d</span></div>");
}

#[test]
fn test_root_template_change_rebuilds() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph("x")).unwrap();
    root.render(&mut renderer, card(label("y"))).unwrap();
    assert_eq!(html_of(&root), "<div><span>y</span></div>");
}

#[test]
fn test_update_with_raw_values() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph("x")).unwrap();
    root.update(&mut renderer, vec![Value::from("raw")]).unwrap();
    assert_eq!(html_of(&root), "<p>raw</p>");
}

#[test]
fn test_pending_value_resolves_on_flush() {
    let mut renderer = Renderer::default();
    let (resolver, pending) = deferred();
    let mut root = renderer.render_root(paragraph(pending)).unwrap();
    assert_eq!(html_of(&root), "<p></p>");

    let report = root.flush(&mut renderer).unwrap();
    assert_eq!(report.pending, 1);
    assert!(!report.is_settled());

    resolver.resolve("late");
    let report = root.flush(&mut renderer).unwrap();
    assert_eq!(
        report,
        FlushReport {
            resolved: 1,
            rejected: 0,
            pending: 0,
        }
    );
    assert_eq!(html_of(&root), "<p>late</p>");
}

#[test]
fn test_stale_pending_value_is_discarded() {
    let mut renderer = Renderer::default();
    let (resolver, pending) = deferred();
    let mut root = renderer.render_root(paragraph(pending)).unwrap();

    root.render(&mut renderer, paragraph("sync")).unwrap();
    resolver.resolve("late");

    let report = root.flush(&mut renderer).unwrap();
    assert_eq!(report, FlushReport::default());
    assert_eq!(html_of(&root), "<p>sync</p>");
}

#[test]
fn test_rejected_pending_keeps_content() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph("before")).unwrap();
    let (resolver, pending) = deferred();
    root.render(&mut renderer, paragraph(pending)).unwrap();

    drop(resolver);
    let report = root.flush(&mut renderer).unwrap();
    assert_eq!(report.rejected, 1);
    assert!(report.is_settled());
    assert_eq!(html_of(&root), "<p>before</p>");

    assert_eq!(root.flush(&mut renderer).unwrap(), FlushReport::default());
}

#[test]
fn test_pending_inside_list_and_shared() {
    let mut renderer = Renderer::default();
    let (resolver, pending) = deferred();
    let items = vec![Value::from(pending.clone()), Value::from("b")];
    let mut root = renderer.render_root(html!("<ul>" {items} "</ul>")).unwrap();
    resolver.resolve("a");
    assert_eq!(root.flush(&mut renderer).unwrap().resolved, 1);
    assert_eq!(html_of(&root), "<ul>ab</ul>");

    let mut root = renderer.render_root(pair(pending.clone(), pending)).unwrap();
    assert_eq!(root.flush(&mut renderer).unwrap().resolved, 2);
    assert_eq!(html_of(&root), "<p>a</p><p>a</p>");
}

#[test]
fn test_already_resolved_deferred() {
    let mut renderer = Renderer::default();
    let mut root = renderer.render_root(paragraph(Deferred::resolved(3))).unwrap();
    assert_eq!(html_of(&root), "<p></p>");
    assert_eq!(root.flush(&mut renderer).unwrap().resolved, 1);
    assert_eq!(html_of(&root), "<p>3</p>");
}
