//! Template compilation is shared across renders

use std::rc::Rc;

use pretty_assertions::assert_eq;
use ssr_html::template::CacheStats;
use ssr_html::{html, Renderer, TemplateKind, TemplateResult, TemplateStrings, Value};

fn greeting(name: &str) -> TemplateResult {
    html!("<p>Hello " {name} "</p>")
}

fn runtime(name: &str) -> TemplateResult {
    let strings = TemplateStrings::new(["<p>Hello ", "</p>"]);
    TemplateResult::html(strings, vec![Value::from(name)])
}

#[test]
fn test_call_site_hits_identity_cache() {
    let mut renderer = Renderer::default();
    for name in ["a", "b", "c"] {
        renderer.render(greeting(name)).unwrap();
    }
    assert_eq!(
        renderer.cache().stats(),
        CacheStats {
            identity_hits: 2,
            content_hits: 0,
            compiles: 1,
        }
    );
}

#[test]
fn test_equal_content_shares_template() {
    let mut renderer = Renderer::default();
    let from_macro = renderer.compile(&greeting("a")).unwrap();
    let first = runtime("b");
    let second = runtime("c");
    assert!(!first.strings().ptr_eq(second.strings()));

    let a = renderer.compile(&first).unwrap();
    let b = renderer.compile(&second).unwrap();
    assert!(Rc::ptr_eq(&from_macro, &a));
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(renderer.cache().stats().compiles, 1);
    assert_eq!(renderer.cache().stats().content_hits, 2);
    assert_eq!(renderer.cache().len(), 1);
}

#[test]
fn test_content_hit_backfills_identity() {
    let mut renderer = Renderer::default();
    renderer.render(greeting("a")).unwrap();
    let other = runtime("b");
    renderer.compile(&other).unwrap();
    renderer.compile(&other).unwrap();
    let stats = renderer.cache().stats();
    assert_eq!(stats.content_hits, 1);
    assert_eq!(stats.identity_hits, 1);
}

#[test]
fn test_kinds_compile_separately() {
    let mut renderer = Renderer::default();
    let strings = TemplateStrings::new(["<g>", "</g>"]);
    let html = TemplateResult::new(strings.clone(), vec![], TemplateKind::Html);
    let svg = TemplateResult::new(strings, vec![], TemplateKind::Svg);
    let a = renderer.compile(&html).unwrap();
    let b = renderer.compile(&svg).unwrap();
    assert!(!Rc::ptr_eq(&a, &b));
    assert_eq!(a.kind(), TemplateKind::Html);
    assert_eq!(b.kind(), TemplateKind::Svg);
}

#[test]
fn test_expired_identities_are_purged() {
    let mut renderer = Renderer::default();
    renderer.render(runtime("a")).unwrap();
    renderer.render(runtime("b")).unwrap();
    assert_eq!(renderer.cache_mut().purge_expired(), 1);
    assert_eq!(renderer.cache().len(), 1);
}

#[test]
fn test_separate_renderers_do_not_share() {
    let mut first = Renderer::default();
    let mut second = Renderer::default();
    first.render(greeting("a")).unwrap();
    second.render(greeting("a")).unwrap();
    assert_eq!(first.cache().stats().compiles, 1);
    assert_eq!(second.cache().stats().compiles, 1);

    first.cache_mut().clear();
    assert!(first.cache().is_empty());
}
