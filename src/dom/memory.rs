//! In-process arena tree engine.
//!
//! Nodes live in a `Vec` and are never freed, so a [`NodeId`] stays valid for
//! the lifetime of the engine. Child lists are `SmallVec`s, names and
//! character data are `CompactString`s.

use compact_str::CompactString;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::markup::{parse_fragment, serialize_children, serialize_node};
use super::{HostError, NodeId, NodeKind, TreeEngine};

const TEMPLATE_TAG: &str = "template";

// ============================================================================
// Engine Profile
// ============================================================================

/// Platform behaviour of a [`MemoryDom`].
///
/// Each flag mirrors one way real document engines differ in how they treat
/// `<template>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProfile {
    /// Parser, cloning and markup accessors understand template content.
    pub native_template: bool,
    /// Native deep clone also copies the content of templates nested inside
    /// copied template content.
    pub nested_template_clone: bool,
    /// Elements can take type-specific behaviour from a shared behaviour set.
    pub behavior_delegation: bool,
    /// Per-instance accessor definition is refused.
    pub lock_instance_accessors: bool,
    /// Imported fragments come back with children missing their parent link.
    pub fragment_import_quirk: bool,
}

impl EngineProfile {
    /// Full native template support.
    pub const fn modern() -> Self {
        Self {
            native_template: true,
            nested_template_clone: true,
            behavior_delegation: true,
            lock_instance_accessors: false,
            fragment_import_quirk: false,
        }
    }

    /// Native templates whose deep clone drops nested template content.
    pub const fn flawed_clone() -> Self {
        Self {
            nested_template_clone: false,
            ..Self::modern()
        }
    }

    /// No native templates; behaviour delegation available.
    pub const fn legacy() -> Self {
        Self {
            native_template: false,
            nested_template_clone: false,
            ..Self::modern()
        }
    }

    /// No native templates, no behaviour delegation, per-instance accessors
    /// refused.
    pub const fn locked() -> Self {
        Self {
            behavior_delegation: false,
            lock_instance_accessors: true,
            ..Self::legacy()
        }
    }

    /// No native templates, no behaviour delegation, broken fragment import.
    pub const fn trident() -> Self {
        Self {
            behavior_delegation: false,
            fragment_import_quirk: true,
            ..Self::legacy()
        }
    }
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self::modern()
    }
}

// ============================================================================
// Nodes
// ============================================================================

type Attributes = SmallVec<[(CompactString, CompactString); 4]>;

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Fragment,
    Element {
        name: CompactString,
        attrs: Attributes,
    },
    Text(CompactString),
    Comment(CompactString),
}

impl NodeData {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Document => NodeKind::Document,
            Self::Fragment => NodeKind::Fragment,
            Self::Element { .. } => NodeKind::Element,
            Self::Text(_) => NodeKind::Text,
            Self::Comment(_) => NodeKind::Comment,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    owner: NodeId,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    /// Native template content.
    content: Option<NodeId>,
}

// ============================================================================
// MemoryDom
// ============================================================================

/// Reference [`TreeEngine`] holding any number of documents in one arena.
#[derive(Debug, Default)]
pub struct MemoryDom {
    profile: EngineProfile,
    nodes: Vec<Node>,
    /// Elements carrying a per-instance markup accessor.
    accessors: FxHashSet<NodeId>,
}

impl MemoryDom {
    pub fn new(profile: EngineProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    #[inline]
    pub fn profile(&self) -> EngineProfile {
        self.profile
    }

    /// Number of nodes ever allocated.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether [`TreeEngine::define_markup_accessor`] succeeded for `node`.
    #[inline]
    pub fn has_instance_accessor(&self, node: NodeId) -> bool {
        self.accessors.contains(&node)
    }

    /// Load a full document from markup into a fresh document.
    pub fn parse_document(&mut self, markup: &str) -> Result<NodeId, HostError> {
        let doc = self.create_document();
        let body = self.body(doc).ok_or(HostError::MissingBody(doc))?;
        parse_fragment(self, body, markup)?;
        Ok(doc)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, data: NodeData, owner: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            data,
            owner: owner.unwrap_or(id),
            parent: None,
            children: SmallVec::new(),
            content: None,
        });
        id
    }

    fn is_native_template(&self, node: NodeId) -> bool {
        self.profile.native_template && self.local_name(node) == Some(TEMPLATE_TAG)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.node(node).parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Unlink `node` from its parent's child list, if it has one.
    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != node);
        }
    }

    fn adopt(&mut self, doc: NodeId, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let n = self.node_mut(id);
            n.owner = doc;
            stack.extend(n.children.iter().copied());
            stack.extend(n.content);
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if !self.kind(parent).is_container() {
            return Err(HostError::HierarchyRequest("parent cannot have children"));
        }
        if self.kind(child) == NodeKind::Document {
            return Err(HostError::HierarchyRequest("a document cannot be inserted"));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(HostError::HierarchyRequest("node is an ancestor of the parent"));
        }
        Ok(())
    }

    /// Nodes to insert for `child`: a fragment contributes its children
    /// (emptying it), anything else itself (detached from its old parent).
    fn take_insertable(&mut self, child: NodeId) -> SmallVec<[NodeId; 4]> {
        if self.kind(child) == NodeKind::Fragment {
            let taken = std::mem::take(&mut self.node_mut(child).children);
            for id in &taken {
                self.node_mut(*id).parent = None;
            }
            taken
        } else {
            self.detach(child);
            smallvec::smallvec![child]
        }
    }

    fn link(&mut self, parent: NodeId, nodes: &[NodeId]) {
        let doc = self.owner_document(parent);
        for id in nodes {
            self.node_mut(*id).parent = Some(parent);
            self.adopt(doc, *id);
        }
    }

    fn clone_inner(
        &mut self,
        node: NodeId,
        deep: bool,
        owner: NodeId,
        copy_content: bool,
    ) -> NodeId {
        let data = self.node(node).data.clone();
        let is_document = matches!(data, NodeData::Document);
        let copy = self.alloc(data, (!is_document).then_some(owner));
        let owner = if is_document { copy } else { owner };

        if let Some(content) = self.node(node).content {
            let fragment = self.alloc(NodeData::Fragment, Some(owner));
            self.node_mut(copy).content = Some(fragment);
            if deep && copy_content {
                let nested = self.profile.nested_template_clone;
                for child in self.node(content).children.clone() {
                    let child_copy = self.clone_inner(child, true, owner, nested);
                    self.node_mut(child_copy).parent = Some(fragment);
                    self.node_mut(fragment).children.push(child_copy);
                }
            }
        }

        if deep {
            for child in self.node(node).children.clone() {
                let child_copy = self.clone_inner(child, true, owner, copy_content);
                self.node_mut(child_copy).parent = Some(copy);
                self.node_mut(copy).children.push(child_copy);
            }
        }
        copy
    }

    /// Where parsed or serialized children of `node` live.
    fn child_holder(&self, node: NodeId) -> NodeId {
        self.node(node).content.unwrap_or(node)
    }
}

impl TreeEngine for MemoryDom {
    fn create_document(&mut self) -> NodeId {
        let doc = self.alloc(NodeData::Document, None);
        let html = self.create_element(doc, "html");
        let head = self.create_element(doc, "head");
        let body = self.create_element(doc, "body");
        self.link(html, &[head, body]);
        self.node_mut(html).children.extend([head, body]);
        self.link(doc, &[html]);
        self.node_mut(doc).children.push(html);
        doc
    }

    fn create_element(&mut self, doc: NodeId, tag: &str) -> NodeId {
        let name = CompactString::from(tag.to_ascii_lowercase());
        let element = self.alloc(
            NodeData::Element {
                name,
                attrs: SmallVec::new(),
            },
            Some(doc),
        );
        if self.is_native_template(element) {
            let content = self.alloc(NodeData::Fragment, Some(doc));
            self.node_mut(element).content = Some(content);
        }
        element
    }

    fn create_text(&mut self, doc: NodeId, data: &str) -> NodeId {
        self.alloc(NodeData::Text(data.into()), Some(doc))
    }

    fn create_comment(&mut self, doc: NodeId, data: &str) -> NodeId {
        self.alloc(NodeData::Comment(data.into()), Some(doc))
    }

    fn create_fragment(&mut self, doc: NodeId) -> NodeId {
        self.alloc(NodeData::Fragment, Some(doc))
    }

    #[inline]
    fn kind(&self, node: NodeId) -> NodeKind {
        self.node(node).data.kind()
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    fn attributes(&self, node: NodeId) -> Vec<(&str, &str)> {
        match &self.node(node).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).data {
            NodeData::Text(data) | NodeData::Comment(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[inline]
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.to_vec()
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).children.first().copied()
    }

    #[inline]
    fn owner_document(&self, node: NodeId) -> NodeId {
        self.node(node).owner
    }

    fn body(&self, doc: NodeId) -> Option<NodeId> {
        let html = self
            .node(doc)
            .children
            .iter()
            .copied()
            .find(|c| self.local_name(*c) == Some("html"))?;
        self.node(html)
            .children
            .iter()
            .copied()
            .find(|c| self.local_name(*c) == Some("body"))
    }

    fn query_selector_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self
                .local_name(id)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            {
                found.push(id);
            }
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        found
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(node).data {
            match attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some((_, existing)) => *existing = value.into(),
                None => attrs.push((name.to_ascii_lowercase().into(), value.into())),
            }
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, HostError> {
        self.check_insert(parent, child)?;
        let nodes = self.take_insertable(child);
        self.link(parent, &nodes);
        self.node_mut(parent).children.extend(nodes);
        Ok(child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, HostError> {
        if self.node(child).parent != Some(parent) {
            return Err(HostError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<NodeId, HostError> {
        if self.node(old).parent != Some(parent) {
            return Err(HostError::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(old);
        }
        self.check_insert(parent, new)?;

        let nodes = self.take_insertable(new);
        // `new` may have been a sibling before `old`, so look the slot up late
        let index = self
            .node(parent)
            .children
            .iter()
            .position(|c| *c == old)
            .ok_or(HostError::NotAChild { parent, child: old })?;
        self.link(parent, &nodes);
        let children = &mut self.node_mut(parent).children;
        children.remove(index);
        children.insert_many(index, nodes);
        self.node_mut(old).parent = None;
        Ok(old)
    }

    fn adopt_node(&mut self, doc: NodeId, node: NodeId) -> Result<NodeId, HostError> {
        if self.kind(node) == NodeKind::Document {
            return Err(HostError::HierarchyRequest("a document cannot be adopted"));
        }
        self.detach(node);
        self.adopt(doc, node);
        Ok(node)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, HostError> {
        let owner = self.owner_document(node);
        Ok(self.clone_inner(node, deep, owner, true))
    }

    fn import_node(
        &mut self,
        doc: NodeId,
        node: NodeId,
        deep: bool,
    ) -> Result<NodeId, HostError> {
        if self.kind(node) == NodeKind::Document {
            return Err(HostError::HierarchyRequest("a document cannot be imported"));
        }
        let copy = self.clone_inner(node, deep, doc, true);
        if self.profile.fragment_import_quirk && self.kind(copy) == NodeKind::Fragment {
            for child in self.node(copy).children.clone() {
                self.node_mut(child).parent = None;
            }
        }
        Ok(copy)
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), HostError> {
        let holder = self.child_holder(node);
        if !self.kind(holder).is_container() {
            return Err(HostError::HierarchyRequest("node cannot have children"));
        }
        for child in self.node(holder).children.clone() {
            self.detach(child);
        }
        parse_fragment(self, holder, markup)
    }

    fn inner_html(&self, node: NodeId) -> Result<String, HostError> {
        let holder = self.child_holder(node);
        serialize_children(self, holder, &|n| self.node(n).content)
    }

    fn outer_html(&self, node: NodeId) -> Result<String, HostError> {
        serialize_node(self, node, &|n| self.node(n).content)
    }

    #[inline]
    fn has_native_template(&self) -> bool {
        self.profile.native_template
    }

    #[inline]
    fn template_content(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).content
    }

    #[inline]
    fn supports_behavior_delegation(&self) -> bool {
        self.profile.behavior_delegation
    }

    fn define_markup_accessor(&mut self, node: NodeId) -> Result<(), HostError> {
        if self.profile.lock_instance_accessors {
            return Err(HostError::AccessorRestricted);
        }
        self.accessors.insert(node);
        Ok(())
    }

    #[inline]
    fn has_fragment_import_quirk(&self) -> bool {
        self.profile.fragment_import_quirk
    }
}

// ============================================================================
// Tests
// ============================================================================
