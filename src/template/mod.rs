//! Inert `<template>` content on top of any [`TreeEngine`].
//!
//! [`Templates`] is the layer application code talks to instead of the raw
//! engine for three operations: element creation, cloning and importing.
//! Everything else goes straight to the engine through [`Templates::engine`]
//! and [`Templates::engine_mut`].
//!
//! What the layer does depends on [`Capabilities`] probed once at start-up:
//!
//! | Engine                          | Content storage     | Clone / import       |
//! |---------------------------------|---------------------|----------------------|
//! | native templates, sound clone   | native              | native               |
//! | native templates, flawed clone  | native              | repaired             |
//! | no native templates             | emulated fragments  | repaired             |
//!
//! Emulated content fragments belong to one auxiliary document, created with
//! the layer and used as the staging area for markup assignment.

mod clone;
mod decorate;
mod error;
mod markup;
mod probe;

pub use error::TemplateError;
pub use probe::Capabilities;

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{InertConfig, MismatchPolicy};
use crate::dom::{NodeId, TreeEngine};
use crate::log;

/// An element with isolated content: the element handle plus the handle of
/// the fragment holding its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateElement {
    element: NodeId,
    content: NodeId,
}

impl TemplateElement {
    #[inline]
    pub const fn element(&self) -> NodeId {
        self.element
    }

    #[inline]
    pub const fn content(&self) -> NodeId {
        self.content
    }
}

/// Template-aware façade over a host tree engine.
pub struct Templates<E: TreeEngine> {
    engine: E,
    caps: Capabilities,
    tag: CompactString,
    on_mismatch: MismatchPolicy,
    /// The live document scanned by [`Templates::content_loaded`].
    document: NodeId,
    /// Auxiliary document owning emulated content; `None` on native engines.
    content_doc: Option<NodeId>,
    /// Emulated content fragments by element.
    contents: FxHashMap<NodeId, NodeId>,
    /// Elements with a per-instance markup accessor.
    accessors: FxHashSet<NodeId>,
    /// Cleared for good the first time the engine refuses an accessor.
    can_decorate: bool,
    loaded: bool,
}

impl<E: TreeEngine> Templates<E> {
    /// Install the layer over `engine` for the live `document`.
    pub fn new(engine: E, document: NodeId) -> Self {
        Self::with_config(engine, document, &InertConfig::default())
    }

    /// Install the layer with explicit settings.
    ///
    /// Engines report lowercase names, so the configured tag is lowercased.
    pub fn with_config(mut engine: E, document: NodeId, config: &InertConfig) -> Self {
        crate::logger::set_enabled(config.log.enable);
        if let Err(err) = config.validate() {
            log!("warn"; "{err}");
        }

        let tag = CompactString::from(config.tag.to_ascii_lowercase());
        let caps = Capabilities::probe(&mut engine, document, &tag);
        log!(
            "probe";
            "<{}>: emulation {}, clone repair {}, delegation {}",
            tag,
            caps.needs_emulation,
            caps.needs_clone_repair,
            caps.behavior_delegation
        );

        let content_doc = caps.needs_emulation.then(|| engine.create_document());

        Self {
            engine,
            caps,
            tag,
            on_mismatch: config.fixup.on_mismatch,
            document,
            content_doc,
            contents: FxHashMap::default(),
            accessors: FxHashSet::default(),
            can_decorate: true,
            loaded: false,
        }
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Whether template content is emulated rather than native.
    #[inline]
    pub fn is_emulated(&self) -> bool {
        self.caps.needs_emulation
    }

    /// The auxiliary document owning emulated content.
    #[inline]
    pub fn content_document(&self) -> Option<NodeId> {
        self.content_doc
    }

    #[inline]
    pub fn document(&self) -> NodeId {
        self.document
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Raw engine access. Mutations made here bypass the layer.
    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Whether `node` is an element named like the template tag.
    #[inline]
    pub fn is_template(&self, node: NodeId) -> bool {
        self.engine.local_name(node) == Some(self.tag.as_str())
    }

    /// The content fragment of `node`, if it is a (decorated) template.
    pub fn content(&self, node: NodeId) -> Option<NodeId> {
        if self.caps.needs_emulation {
            self.contents.get(&node).copied()
        } else if self.is_template(node) {
            self.engine.template_content(node)
        } else {
            None
        }
    }

    pub fn as_template(&self, node: NodeId) -> Option<TemplateElement> {
        self.content(node)
            .map(|content| TemplateElement { element: node, content })
    }

    /// Create an element; templates come back decorated.
    pub fn create_element(&mut self, doc: NodeId, tag: &str) -> Result<NodeId, TemplateError> {
        let element = self.engine.create_element(doc, tag);
        if self.caps.needs_emulation && self.is_template(element) {
            self.decorate(element)?;
        }
        Ok(element)
    }

    /// Run the start-up scan over the live document once the host has
    /// finished parsing it.
    ///
    /// Returns `false` if the scan already ran.
    pub fn content_loaded(&mut self) -> Result<bool, TemplateError> {
        if self.loaded {
            return Ok(false);
        }
        self.loaded = true;
        self.bootstrap(self.document)?;
        log!("bootstrap"; "{} templates decorated", self.contents.len());
        Ok(true)
    }
}
