//! Host tree engine seam.
//!
//! The template layer never touches nodes directly. Everything it needs from
//! the document engine (creating nodes, moving them, cloning, importing,
//! parsing and serializing markup) goes through [`TreeEngine`].
//!
//! [`MemoryDom`] is the in-process reference engine. Its [`EngineProfile`]
//! reproduces the platform differences the template layer has to cope with:
//! engines without native templates, engines whose deep clone loses nested
//! template content, engines that refuse per-instance accessors, and engines
//! whose fragment import hands back half-detached children.

mod error;
pub mod markup;
mod memory;

pub use error::HostError;
pub use memory::{EngineProfile, MemoryDom};

/// Handle to a node owned by a [`TreeEngine`].
///
/// Handles are plain arena indices: cheap to copy, only meaningful for the
/// engine that issued them. An engine holds at most `u32::MAX + 1` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Panics past `u32::MAX`, like the arena `Vec` does past its capacity.
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self(index),
            Err(_) => panic!("node arena exceeds {} nodes", u64::from(u32::MAX) + 1),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The node types the template layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element,
    Text,
    Comment,
}

impl NodeKind {
    /// Whether descendants of this node can be selected (`querySelectorAll`).
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Document | Self::Fragment | Self::Element)
    }
}

/// The tree-mutation and parsing API of a host document engine.
///
/// Every method here is the *native* primitive. The template layer wraps
/// `create_element`, `clone_node` and `import_node` to keep template content
/// isolated; everything else is used as-is.
pub trait TreeEngine {
    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached document with an `html > (head, body)` skeleton.
    fn create_document(&mut self) -> NodeId;

    fn create_element(&mut self, doc: NodeId, tag: &str) -> NodeId;

    fn create_text(&mut self, doc: NodeId, data: &str) -> NodeId;

    fn create_comment(&mut self, doc: NodeId, data: &str) -> NodeId;

    fn create_fragment(&mut self, doc: NodeId) -> NodeId;

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    fn kind(&self, node: NodeId) -> NodeKind;

    /// Lowercase tag name, `None` for non-elements.
    fn local_name(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Attributes of an element in insertion order.
    fn attributes(&self, node: NodeId) -> Vec<(&str, &str)>;

    /// Character data of text and comment nodes.
    fn text(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child list snapshot in tree order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    /// The owning document. A document owns itself.
    fn owner_document(&self, node: NodeId) -> NodeId;

    /// The `<body>` element of a document.
    fn body(&self, doc: NodeId) -> Option<NodeId>;

    /// All descendant elements of `root` named `tag`, in document order.
    ///
    /// Native template content is not part of the tree and is never entered.
    fn query_selector_all(&self, root: NodeId, tag: &str) -> Vec<NodeId>;

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Append `child` to `parent`, detaching it from its old parent first.
    ///
    /// Appending a fragment moves the fragment's children instead and leaves
    /// the fragment empty. Inserted nodes are adopted by `parent`'s document.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, HostError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, HostError>;

    /// Replace `old` with `new` in `parent`, returning `old`.
    fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<NodeId, HostError>;

    /// Move `node` (and its subtree) into `doc`'s ownership.
    fn adopt_node(&mut self, doc: NodeId, node: NodeId) -> Result<NodeId, HostError>;

    // ------------------------------------------------------------------
    // Duplication
    // ------------------------------------------------------------------

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, HostError>;

    fn import_node(
        &mut self,
        doc: NodeId,
        node: NodeId,
        deep: bool,
    ) -> Result<NodeId, HostError>;

    // ------------------------------------------------------------------
    // Markup
    // ------------------------------------------------------------------

    /// Replace the children of `node` with the parse of `markup`.
    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), HostError>;

    fn inner_html(&self, node: NodeId) -> Result<String, HostError>;

    fn outer_html(&self, node: NodeId) -> Result<String, HostError>;

    // ------------------------------------------------------------------
    // Platform traits
    // ------------------------------------------------------------------

    /// Whether the engine has its own inert `<template>` element.
    fn has_native_template(&self) -> bool;

    /// The native content fragment of a template element.
    fn template_content(&self, node: NodeId) -> Option<NodeId>;

    /// Whether elements can be handed type-specific behaviour through a shared
    /// behaviour set instead of per-instance overrides.
    fn supports_behavior_delegation(&self) -> bool;

    /// Define a markup accessor on a single element instance.
    fn define_markup_accessor(&mut self, node: NodeId) -> Result<(), HostError>;

    /// Whether importing a fragment can return children that lost their
    /// parent link.
    fn has_fragment_import_quirk(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_index() {
        assert_eq!(NodeId::new(0).index(), 0);
        assert_eq!(NodeId::new(u32::MAX as usize).index(), u32::MAX as usize);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "node arena exceeds")]
    fn test_node_id_past_u32_panics() {
        NodeId::new(u32::MAX as usize + 1);
    }
}
