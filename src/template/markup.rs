//! Markup accessors for emulated content.
//!
//! An emulated template has no live children, so reading or assigning its
//! markup through the engine would see an empty element. When the template
//! carries a markup accessor, reads serialize the content fragment and writes
//! are parsed in the auxiliary document before being moved into it.

use super::{TemplateError, Templates};
use crate::dom::{HostError, NodeId, TreeEngine, markup::serialize_children};

impl<E: TreeEngine> Templates<E> {
    /// Whether markup access to `node` is routed through its content fragment.
    pub fn has_markup_accessor(&self, node: NodeId) -> bool {
        self.caps.needs_emulation
            && self.contents.contains_key(&node)
            && (self.caps.behavior_delegation || self.accessors.contains(&node))
    }

    /// Serialized children of `node`; for templates, of their content.
    pub fn inner_html(&self, node: NodeId) -> Result<String, TemplateError> {
        let Some(content) = self.virtual_content(node) else {
            return Ok(self.engine.inner_html(node)?);
        };
        let content_of = |n: NodeId| self.contents.get(&n).copied();
        Ok(serialize_children(&self.engine, content, &content_of)?)
    }

    /// Replace the children of `node` (the content of templates) with the
    /// parse of `markup`.
    ///
    /// Templates in the new markup are decorated before they are moved in.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), TemplateError> {
        let (Some(content), Some(content_doc)) = (self.virtual_content(node), self.content_doc)
        else {
            return Ok(self.engine.set_inner_html(node, markup)?);
        };
        let body = self
            .engine
            .body(content_doc)
            .ok_or(HostError::MissingBody(content_doc))?;

        if let Err(err) = self.stage_markup(body, markup) {
            self.clear_children(body)?;
            return Err(err);
        }

        self.clear_children(content)?;
        for child in self.engine.children(body) {
            self.engine.append_child(content, child)?;
        }
        Ok(())
    }

    fn virtual_content(&self, node: NodeId) -> Option<NodeId> {
        if self.has_markup_accessor(node) {
            self.contents.get(&node).copied()
        } else {
            None
        }
    }

    /// Parse `markup` into the staging `body` and decorate what it produced.
    fn stage_markup(&mut self, body: NodeId, markup: &str) -> Result<(), TemplateError> {
        self.engine.set_inner_html(body, markup)?;
        self.bootstrap(body)
    }

    fn clear_children(&mut self, node: NodeId) -> Result<(), TemplateError> {
        for child in self.engine.children(node) {
            self.engine.remove_child(node, child)?;
        }
        Ok(())
    }
}
