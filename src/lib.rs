//! Inert - isolated `<template>` content for HTML trees.
//!
//! Children of a template element belong to a detached content fragment, not
//! to the live tree. Engines that lack native templates, or whose deep clone
//! loses content of nested templates, get that behaviour from [`Templates`]:
//!
//! - **Decoration**: a template's children are moved into a fresh fragment of
//!   an auxiliary document.
//! - **Bootstrap**: every template of a document (or freshly parsed subtree)
//!   is decorated in document order.
//! - **Markup virtualization**: `inner_html` reads and writes template
//!   content instead of the (empty) element.
//! - **Clone/import fix-up**: templates inside any copied subtree are
//!   replaced by proper clones of their sources, at any nesting depth.
//!
//! ```
//! use inert::{EngineProfile, MemoryDom, Templates, TreeEngine};
//!
//! let mut dom = MemoryDom::new(EngineProfile::legacy());
//! let doc = dom.parse_document("<template><p>hidden</p></template>").unwrap();
//! let mut templates = Templates::new(dom, doc);
//! templates.content_loaded().unwrap();
//!
//! let body = templates.engine().body(doc).unwrap();
//! let template = templates.engine().first_child(body).unwrap();
//! assert!(templates.engine().children(template).is_empty());
//! assert_eq!(templates.inner_html(template).unwrap(), "<p>hidden</p>");
//! ```

pub mod config;
pub mod dom;
pub mod logger;
pub mod template;

pub use config::{ConfigError, InertConfig, MismatchPolicy};
pub use dom::{EngineProfile, HostError, MemoryDom, NodeId, NodeKind, TreeEngine};
pub use template::{Capabilities, TemplateElement, TemplateError, Templates};
