//! Compiled template cache
//!
//! Lookup is two-level within a partition per [`TemplateKind`]: first by the
//! identity of the [`TemplateStrings`], then by the joined content. A
//! content hit backfills the identity map, so later renders from the same
//! call site skip the join entirely. Identity entries hold only a weak
//! reference to the fragments and are pruned once those are dropped.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::template::{Template, TemplateKind, TemplateResult, TemplateStrings};
use crate::RenderError;

/// Hit and compile counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub identity_hits: usize,
    pub content_hits: usize,
    pub compiles: usize,
}

#[derive(Debug, Default)]
struct Partition {
    by_identity: HashMap<usize, (Weak<[String]>, Rc<Template>)>,
    by_content: HashMap<String, Rc<Template>>,
}

impl Partition {
    fn identity(&self, strings: &TemplateStrings) -> Option<&Rc<Template>> {
        // A dead entry may share an address with a newer allocation
        self.by_identity
            .get(&strings.identity())
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, template)| template)
    }

    fn remember(&mut self, strings: &TemplateStrings, template: Rc<Template>) {
        self.by_identity
            .insert(strings.identity(), (strings.downgrade(), template));
    }

    fn prune(&mut self) -> usize {
        let before = self.by_identity.len();
        self.by_identity.retain(|_, (weak, _)| weak.strong_count() > 0);
        before - self.by_identity.len()
    }
}

/// Cache of compiled templates
#[derive(Debug)]
pub struct TemplateCache {
    partitions: HashMap<TemplateKind, Partition>,
    stats: CacheStats,
    detect_documents: bool,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            partitions: HashMap::new(),
            stats: CacheStats::default(),
            detect_documents: true,
        }
    }

    /// Set whether HTML templates may compile as full documents
    pub fn with_document_detection(mut self, detect: bool) -> Self {
        self.detect_documents = detect;
        self
    }

    /// Look up a template without compiling
    pub fn get(&self, strings: &TemplateStrings, kind: TemplateKind) -> Option<Rc<Template>> {
        let partition = self.partitions.get(&kind)?;
        partition
            .identity(strings)
            .or_else(|| partition.by_content.get(&strings.joined()))
            .cloned()
    }

    /// Return the compiled template for a result, compiling on a full miss
    pub fn get_or_compile(&mut self, result: &TemplateResult) -> Result<Rc<Template>, RenderError> {
        let strings = result.strings();
        let kind = result.kind();
        let partition = self.partitions.entry(kind).or_default();

        if let Some(template) = partition.identity(strings) {
            self.stats.identity_hits += 1;
            log::trace!(target: "ssr_html::cache", "identity hit for {:?} template", kind);
            return Ok(Rc::clone(template));
        }

        let key = strings.joined();
        if let Some(template) = partition.by_content.get(&key).cloned() {
            self.stats.content_hits += 1;
            log::trace!(target: "ssr_html::cache", "content hit for {:?} template", kind);
            partition.prune();
            partition.remember(strings, Rc::clone(&template));
            return Ok(template);
        }

        let template = Rc::new(Template::compile(strings, kind, self.detect_documents)?);
        self.stats.compiles += 1;
        log::debug!(
            target: "ssr_html::cache",
            "cached new {:?} template ({} bytes of markup)",
            kind,
            key.len()
        );
        partition.prune();
        partition.by_content.insert(key, Rc::clone(&template));
        partition.remember(strings, Rc::clone(&template));
        Ok(template)
    }

    /// Drop identity entries whose fragments no longer exist
    pub fn purge_expired(&mut self) -> usize {
        self.partitions.values_mut().map(Partition::prune).sum()
    }

    /// Number of distinct compiled templates
    pub fn len(&self) -> usize {
        self.partitions.values().map(|p| p.by_content.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.partitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(strings: &TemplateStrings, kind: TemplateKind) -> TemplateResult {
        TemplateResult::new(strings.clone(), Vec::new(), kind)
    }

    #[test]
    fn test_identity_then_content_hits() {
        let mut cache = TemplateCache::new();
        let first = TemplateStrings::new(["<p>", "</p>"]);
        let twin = TemplateStrings::new(["<p>", "</p>"]);

        let a = cache.get_or_compile(&result(&first, TemplateKind::Html)).unwrap();
        let b = cache.get_or_compile(&result(&first, TemplateKind::Html)).unwrap();
        let c = cache.get_or_compile(&result(&twin, TemplateKind::Html)).unwrap();
        let d = cache.get_or_compile(&result(&twin, TemplateKind::Html)).unwrap();

        assert!(Rc::ptr_eq(&a, &b));
        assert!(Rc::ptr_eq(&a, &c));
        assert!(Rc::ptr_eq(&a, &d));
        assert_eq!(
            cache.stats(),
            CacheStats {
                identity_hits: 2,
                content_hits: 1,
                compiles: 1,
            }
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_kinds_are_partitioned() {
        let mut cache = TemplateCache::new();
        let strings = TemplateStrings::new(["<g>", "</g>"]);
        let html = cache.get_or_compile(&result(&strings, TemplateKind::Html)).unwrap();
        let svg = cache.get_or_compile(&result(&strings, TemplateKind::Svg)).unwrap();
        assert!(!Rc::ptr_eq(&html, &svg));
        assert_eq!(cache.stats().compiles, 2);
    }

    #[test]
    fn test_dropped_strings_expire() {
        let mut cache = TemplateCache::new();
        let strings = TemplateStrings::new(["<i>", "</i>"]);
        cache.get_or_compile(&result(&strings, TemplateKind::Html)).unwrap();
        drop(strings);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);

        let again = TemplateStrings::new(["<i>", "</i>"]);
        assert!(cache.get(&again, TemplateKind::Html).is_some());
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let mut cache = TemplateCache::new();
        let strings = TemplateStrings::new(["<!-- ", ""]);
        assert!(cache.get_or_compile(&result(&strings, TemplateKind::Html)).is_err());
        assert!(cache.is_empty());
    }
}
