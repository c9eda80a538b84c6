//! Clone and import with template content repair.
//!
//! Native copies either drop emulated content entirely (it is not in the
//! tree) or lose content below the first level of nesting. Both are repaired
//! the same way: every template in the copy is replaced by a proper clone of
//! its source, which recurses until the bottom of the nesting.

use super::{TemplateError, Templates};
use crate::config::MismatchPolicy;
use crate::dom::{HostError, NodeId, NodeKind, TreeEngine};
use crate::log;

impl<E: TreeEngine> Templates<E> {
    /// Clone `node`, repairing any template content inside the copy.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, TemplateError> {
        if !self.caps.patches_cloning() {
            return Ok(self.engine.clone_node(node, deep)?);
        }
        if self.is_template(node)
            && (self.caps.needs_clone_repair || self.contents.contains_key(&node))
        {
            return self.clone_template(node, deep);
        }

        let copy = self.engine.clone_node(node, deep)?;
        if deep {
            self.fix_cloned_subtree(copy, node)?;
        }
        Ok(copy)
    }

    /// Clone a template with independent content.
    ///
    /// The copy always gets its own, fresh content fragment. With `deep`, a
    /// copy of the source's content is moved into it and repaired.
    pub fn clone_template(&mut self, source: NodeId, deep: bool) -> Result<NodeId, TemplateError> {
        if !self.is_template(source) {
            return self.clone_node(source, deep);
        }

        self.decorate(source)?;
        let copy = self.engine.clone_node(source, false)?;
        self.decorate(copy)?;

        if deep {
            let source_content = self
                .content(source)
                .ok_or(TemplateError::MissingContent(source))?;
            let copy_content = self
                .content(copy)
                .ok_or(TemplateError::MissingContent(copy))?;
            let copied = self.engine.clone_node(source_content, true)?;
            self.engine.append_child(copy_content, copied)?;
            self.fix_cloned_subtree(copy_content, source_content)?;
        }
        Ok(copy)
    }

    /// Replace every template in `clone` with a fresh deep clone of the
    /// template at the same position in `source`.
    ///
    /// Both lists are taken in document order. When their lengths differ the
    /// configured [`MismatchPolicy`] decides between failing and pairing the
    /// common prefix.
    pub fn fix_cloned_subtree(&mut self, clone: NodeId, source: NodeId) -> Result<(), TemplateError> {
        if !self.engine.kind(clone).is_container() {
            return Ok(());
        }

        let targets = self.engine.query_selector_all(clone, &self.tag);
        let sources = self.engine.query_selector_all(source, &self.tag);
        if targets.len() != sources.len() {
            match self.on_mismatch {
                MismatchPolicy::Strict => {
                    return Err(TemplateError::CloneMismatch {
                        expected: sources.len(),
                        found: targets.len(),
                    });
                }
                MismatchPolicy::BestEffort => {
                    log!(
                        "warn";
                        "{} templates in source, {} in clone; fixing the first {}",
                        sources.len(),
                        targets.len(),
                        sources.len().min(targets.len())
                    );
                }
            }
        }

        for (s, t) in sources.into_iter().zip(targets) {
            self.decorate(s)?;
            let parent = self.engine.parent(t).ok_or(HostError::Detached(t))?;
            let replacement = self.clone_node(s, true)?;
            self.engine.replace_child(parent, replacement, t)?;
        }
        Ok(())
    }

    /// Import `node` into `doc`, repairing any template content inside the
    /// copy.
    ///
    /// Templates are cloned directly and adopted into `doc`; the source is
    /// left untouched apart from being decorated.
    pub fn import_node(
        &mut self,
        doc: NodeId,
        node: NodeId,
        deep: bool,
    ) -> Result<NodeId, TemplateError> {
        if self.caps.patches_cloning() && self.is_template(node) {
            self.decorate(node)?;
            let copy = self.clone_template(node, deep)?;
            return Ok(self.engine.adopt_node(doc, copy)?);
        }

        let mut copy = self.engine.import_node(doc, node, deep)?;
        if self.caps.rewrap_imported_fragments && self.engine.kind(copy) == NodeKind::Fragment {
            let wrapper = self.engine.create_fragment(doc);
            self.engine.append_child(wrapper, copy)?;
            copy = wrapper;
        }
        if self.caps.patches_cloning() && deep {
            self.fix_cloned_subtree(copy, node)?;
        }
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{InertConfig, MismatchPolicy};
    use crate::dom::{EngineProfile, MemoryDom, NodeId, TreeEngine};
    use crate::template::{TemplateError, Templates};

    const PATCHED: [EngineProfile; 3] = [
        EngineProfile::legacy(),
        EngineProfile::flawed_clone(),
        EngineProfile::trident(),
    ];

    fn loaded(profile: EngineProfile, markup: &str) -> (Templates<MemoryDom>, NodeId) {
        let mut dom = MemoryDom::new(profile);
        let doc = dom.parse_document(markup).unwrap();
        let body = dom.body(doc).unwrap();
        let mut templates = Templates::new(dom, doc);
        templates.content_loaded().unwrap();
        (templates, body)
    }

    fn first(templates: &Templates<MemoryDom>, node: NodeId) -> NodeId {
        templates.engine().first_child(node).unwrap()
    }

    /// The template nested directly in `t`'s content, below one wrapper.
    fn nested(templates: &Templates<MemoryDom>, t: NodeId) -> NodeId {
        let content = templates.content(t).unwrap();
        first(templates, first(templates, content))
    }

    #[test]
    fn test_shallow_clone_independence() {
        for profile in PATCHED {
            let (mut templates, body) = loaded(profile, "<template id=\"a\"><p>x</p></template>");
            let a = first(&templates, body);

            let copy = templates.clone_node(a, false).unwrap();

            assert_eq!(templates.engine().attribute(copy, "id"), Some("a"));
            let source_content = templates.content(a).unwrap();
            let copy_content = templates.content(copy).unwrap();
            assert_ne!(source_content, copy_content);
            assert!(templates.engine().children(copy_content).is_empty());

            let doc = templates.document();
            let extra = templates.engine_mut().create_element(doc, "i");
            templates
                .engine_mut()
                .append_child(copy_content, extra)
                .unwrap();
            assert_eq!(templates.engine().children(source_content).len(), 1);
        }
    }

    #[test]
    fn test_deep_clone_depth_one() {
        for profile in PATCHED {
            let (mut templates, body) =
                loaded(profile, "<template><p class=\"k\">text</p></template>");
            let a = first(&templates, body);
            let p = first(&templates, templates.content(a).unwrap());

            let copy = templates.clone_node(a, true).unwrap();

            let copy_content = templates.content(copy).unwrap();
            assert_ne!(copy_content, templates.content(a).unwrap());
            let p_copy = first(&templates, copy_content);
            assert_ne!(p_copy, p);
            assert_eq!(templates.engine().attribute(p_copy, "class"), Some("k"));
            assert_eq!(
                templates.inner_html(copy).unwrap(),
                templates.inner_html(a).unwrap()
            );
            assert_eq!(
                templates.engine().outer_html(p_copy).unwrap(),
                "<p class=\"k\">text</p>"
            );
        }
    }

    #[test]
    fn test_deep_clone_depth_n() {
        for profile in PATCHED {
            let (mut templates, body) = loaded(
                profile,
                "<template id=\"a\"><div><template id=\"b\"><div>\
                 <template id=\"c\"><span>leaf</span></template>\
                 </div></template></div></template>",
            );
            let a = first(&templates, body);
            let b = nested(&templates, a);
            let c = nested(&templates, b);

            let a2 = templates.clone_template(a, true).unwrap();
            let b2 = nested(&templates, a2);
            let c2 = nested(&templates, b2);

            let dom = templates.engine();
            assert_eq!(dom.attribute(b2, "id"), Some("b"));
            assert_eq!(dom.attribute(c2, "id"), Some("c"));
            for (source, copy) in [(a, a2), (b, b2), (c, c2)] {
                assert_ne!(source, copy);
                assert_ne!(templates.content(source), templates.content(copy));
            }
            let leaf = first(&templates, templates.content(c2).unwrap());
            assert_eq!(dom.local_name(leaf), Some("span"));
            assert_ne!(leaf, first(&templates, templates.content(c).unwrap()));
        }
    }

    #[test]
    fn test_generic_deep_clone_repairs_templates() {
        for profile in PATCHED {
            let (mut templates, body) = loaded(
                profile,
                "<section><h1>t</h1><template><template><b>x</b></template></template></section>",
            );
            let section = first(&templates, body);

            let copy = templates.clone_node(section, true).unwrap();

            let children = templates.engine().children(copy);
            assert_eq!(children.len(), 2);
            let t = children[1];
            assert!(templates.engine().children(t).is_empty());
            let inner = first(&templates, templates.content(t).unwrap());
            let b = first(&templates, templates.content(inner).unwrap());
            assert_eq!(templates.engine().local_name(b), Some("b"));
        }
    }

    #[test]
    fn test_import_standalone_template() {
        for profile in PATCHED {
            let mut dom = MemoryDom::new(profile);
            let source_doc = dom.create_document();
            let target = dom.create_document();
            let mut templates = Templates::new(dom, source_doc);

            let a = templates.create_element(source_doc, "template").unwrap();
            templates
                .set_inner_html(a, "<p>one</p><template><i>two</i></template>")
                .unwrap();
            let before = templates.inner_html(a).unwrap();
            let a_content = templates.content(a).unwrap();
            let a_children = templates.engine().children(a_content);

            let copy = templates.import_node(target, a, true).unwrap();

            assert_eq!(templates.engine().owner_document(copy), target);
            assert_eq!(templates.engine().owner_document(a), source_doc);
            assert_eq!(templates.content(a), Some(a_content));
            assert_eq!(templates.engine().children(a_content), a_children);
            assert_eq!(templates.inner_html(a).unwrap(), before);

            let copy_content = templates.content(copy).unwrap();
            let copy_children = templates.engine().children(copy_content);
            assert_eq!(copy_children.len(), 2);
            assert!(copy_children.iter().all(|c| !a_children.contains(c)));
            let nested = templates.content(copy_children[1]).unwrap();
            assert_eq!(templates.engine().children(nested).len(), 1);
        }
    }

    #[test]
    fn test_import_subtree_repairs_templates() {
        let (mut templates, body) = loaded(
            EngineProfile::legacy(),
            "<div><template><em>x</em></template></div>",
        );
        let target = templates.engine_mut().create_document();
        let div = first(&templates, body);

        let copy = templates.import_node(target, div, true).unwrap();

        assert_eq!(templates.engine().owner_document(copy), target);
        let t = first(&templates, copy);
        assert_eq!(templates.engine().owner_document(t), target);
        let em = first(&templates, templates.content(t).unwrap());
        assert_eq!(templates.engine().local_name(em), Some("em"));
    }

    #[test]
    fn test_import_fragment_rewrapped() {
        let mut dom = MemoryDom::new(EngineProfile::trident());
        let source = dom.create_document();
        let target = dom.create_document();
        let mut templates = Templates::new(dom, source);

        let fragment = templates.engine_mut().create_fragment(source);
        let p = templates.create_element(source, "p").unwrap();
        let t = templates.create_element(source, "template").unwrap();
        templates.engine_mut().append_child(fragment, p).unwrap();
        templates.engine_mut().append_child(fragment, t).unwrap();
        let t_content = templates.content(t).unwrap();
        let b = templates.create_element(source, "b").unwrap();
        templates.engine_mut().append_child(t_content, b).unwrap();

        let copy = templates.import_node(target, fragment, true).unwrap();

        let children = templates.engine().children(copy);
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(templates.engine().parent(*child), Some(copy));
        }
        let t_copy = children[1];
        let b_copy = first(&templates, templates.content(t_copy).unwrap());
        assert_ne!(b_copy, b);
        assert_eq!(templates.engine().local_name(b_copy), Some("b"));
    }

    #[test]
    fn test_strict_mismatch_fails() {
        let mut dom = MemoryDom::new(EngineProfile::legacy());
        let doc = dom.create_document();
        let config = InertConfig::from_str("[fixup]\non_mismatch = \"strict\"").unwrap();
        assert_eq!(config.fixup.on_mismatch, MismatchPolicy::Strict);
        let mut templates = Templates::with_config(dom, doc, &config);

        let source = templates.create_element(doc, "div").unwrap();
        let clone = templates.create_element(doc, "div").unwrap();
        for _ in 0..2 {
            let t = templates.create_element(doc, "template").unwrap();
            templates.engine_mut().append_child(source, t).unwrap();
        }
        let t = templates.create_element(doc, "template").unwrap();
        templates.engine_mut().append_child(clone, t).unwrap();

        let err = templates.fix_cloned_subtree(clone, source).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::CloneMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_best_effort_mismatch_fixes_prefix() {
        let mut dom = MemoryDom::new(EngineProfile::legacy());
        let doc = dom.create_document();
        let mut templates = Templates::new(dom, doc);

        let source = templates.create_element(doc, "div").unwrap();
        let clone = templates.create_element(doc, "div").unwrap();
        let s1 = templates.create_element(doc, "template").unwrap();
        templates.engine_mut().set_attribute(s1, "id", "first");
        let s2 = templates.create_element(doc, "template").unwrap();
        templates.engine_mut().append_child(source, s1).unwrap();
        templates.engine_mut().append_child(source, s2).unwrap();
        let t = templates.create_element(doc, "template").unwrap();
        templates.engine_mut().append_child(clone, t).unwrap();

        templates.fix_cloned_subtree(clone, source).unwrap();

        let replaced = first(&templates, clone);
        assert_ne!(replaced, t);
        assert_eq!(templates.engine().attribute(replaced, "id"), Some("first"));
        assert_eq!(templates.engine().children(clone).len(), 1);
    }

    #[test]
    fn test_fix_skips_leaf_nodes() {
        let mut dom = MemoryDom::new(EngineProfile::legacy());
        let doc = dom.create_document();
        let text = dom.create_text(doc, "x");
        let mut templates = Templates::new(dom, doc);
        templates.fix_cloned_subtree(text, text).unwrap();
    }

    #[test]
    fn test_native_engine_passes_through() {
        let (mut templates, body) = loaded(
            EngineProfile::modern(),
            "<template><template><i>x</i></template></template>",
        );
        assert!(!templates.capabilities().patches_cloning());
        let a = first(&templates, body);

        let copy = templates.clone_node(a, true).unwrap();
        let inner = first(&templates, templates.content(copy).unwrap());
        let i = first(&templates, templates.content(inner).unwrap());
        assert_eq!(templates.engine().local_name(i), Some("i"));

        let target = templates.engine_mut().create_document();
        let imported = templates.import_node(target, a, true).unwrap();
        assert_eq!(templates.engine().owner_document(imported), target);
    }
}
