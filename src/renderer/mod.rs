//! Rendering template results to HTML
//!
//! A [`Renderer`] owns the configuration and the template cache. Rendering
//! a [`TemplateResult`] compiles (or looks up) its template, clones it into
//! a fresh tree inside a [`RenderRoot`], applies the values and serializes.
//! Keeping the `RenderRoot` around allows later renders to patch the same
//! tree in place.

pub mod config;
pub mod html;

pub use config::{ConfigError, RenderConfig, SerializeConfig};
pub use html::{serialize, HtmlWriter};

use std::path::Path;
use std::rc::Rc;

use crate::dom::{NodeId, Tree};
use crate::part::{FlushReport, UpdateContext};
use crate::template::{Template, TemplateCache, TemplateInstance, TemplateResult};
use crate::value::Value;
use crate::RenderError;

/// Renders template results, caching compiled templates across renders
#[derive(Debug)]
pub struct Renderer {
    config: RenderConfig,
    cache: TemplateCache,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let cache = TemplateCache::new().with_document_detection(config.detect_documents);
        Self { config, cache }
    }

    /// Create a renderer from a TOML configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        Ok(Self::new(RenderConfig::from_file(path.as_ref())?))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TemplateCache {
        &mut self.cache
    }

    /// Return the compiled template for a result
    pub fn compile(&mut self, result: &TemplateResult) -> Result<Rc<Template>, RenderError> {
        self.cache.get_or_compile(result)
    }

    /// Clone a template into a fresh tree without applying any values
    pub fn instantiate(&self, template: Rc<Template>) -> Result<RenderRoot, RenderError> {
        let mut tree = Tree::new();
        let (instance, root) = TemplateInstance::clone_into(&mut tree, template)?;
        Ok(RenderRoot {
            tree,
            root,
            instance,
        })
    }

    /// Render a result into a new [`RenderRoot`] that can be updated later
    pub fn render_root(&mut self, result: TemplateResult) -> Result<RenderRoot, RenderError> {
        let template = self.compile(&result)?;
        let mut root = self.instantiate(template)?;
        root.update(self, result.into_values())?;
        Ok(root)
    }

    /// Render a result to an HTML string
    pub fn render(&mut self, result: TemplateResult) -> Result<String, RenderError> {
        let root = self.render_root(result)?;
        Ok(root.to_html(&self.config.serialize))
    }

    fn context<'a>(&'a mut self, tree: &'a mut Tree) -> UpdateContext<'a> {
        UpdateContext {
            tree,
            cache: &mut self.cache,
            config: &self.config,
        }
    }
}

/// A live tree produced by rendering one template
#[derive(Debug)]
pub struct RenderRoot {
    tree: Tree,
    root: NodeId,
    instance: TemplateInstance,
}

impl RenderRoot {
    /// Apply new values to the existing instance
    pub fn update(&mut self, renderer: &mut Renderer, values: Vec<Value>) -> Result<(), RenderError> {
        let mut cx = renderer.context(&mut self.tree);
        self.instance.update(&mut cx, values)
    }

    /// Render a result here, patching in place when it uses the same template
    pub fn render(&mut self, renderer: &mut Renderer, result: TemplateResult) -> Result<(), RenderError> {
        let template = renderer.compile(&result)?;
        if !Rc::ptr_eq(self.instance.template(), &template) {
            log::debug!(target: "ssr_html::part", "root template changed, rebuilding tree");
            *self = renderer.instantiate(template)?;
        }
        self.update(renderer, result.into_values())
    }

    /// Apply pending values that have settled since the last flush
    pub fn flush(&mut self, renderer: &mut Renderer) -> Result<FlushReport, RenderError> {
        let mut report = FlushReport::default();
        let mut cx = renderer.context(&mut self.tree);
        self.instance.flush(&mut cx, &mut report)?;
        Ok(report)
    }

    pub fn to_html(&self, config: &SerializeConfig) -> String {
        serialize(&self.tree, self.root, config)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The fragment or document node holding the rendered content
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn instance(&self) -> &TemplateInstance {
        &self.instance
    }
}

/// Render once with a throwaway [`Renderer`] and default configuration
pub fn render_once(result: TemplateResult) -> Result<String, RenderError> {
    Renderer::default().render(result)
}
