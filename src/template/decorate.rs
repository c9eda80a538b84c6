//! Decoration and the bootstrap scan.

use super::{TemplateError, Templates};
use crate::dom::{NodeId, NodeKind, TreeEngine};
use crate::log;

impl<E: TreeEngine> Templates<E> {
    /// Give `element` isolated content by moving its children into a fresh
    /// fragment of the auxiliary document.
    ///
    /// Idempotent. A no-op on engines with native templates.
    pub fn decorate(&mut self, element: NodeId) -> Result<(), TemplateError> {
        let Some(content_doc) = self.content_doc else {
            return Ok(());
        };
        if self.contents.contains_key(&element) || self.engine.kind(element) != NodeKind::Element {
            return Ok(());
        }

        let content = self.engine.create_fragment(content_doc);
        for child in self.engine.children(element) {
            self.engine.append_child(content, child)?;
        }
        self.contents.insert(element, content);

        if !self.caps.behavior_delegation && self.can_decorate {
            match self.engine.define_markup_accessor(element) {
                Ok(()) => {
                    self.accessors.insert(element);
                }
                Err(err) => {
                    self.can_decorate = false;
                    log!("decorate"; "markup accessors disabled: {err}");
                }
            }
        }

        self.bootstrap(content)
    }

    /// Decorate every template under `root`, in document order.
    pub fn bootstrap(&mut self, root: NodeId) -> Result<(), TemplateError> {
        if self.content_doc.is_none() {
            return Ok(());
        }
        for template in self.engine.query_selector_all(root, &self.tag) {
            self.decorate(template)?;
        }
        Ok(())
    }
}
