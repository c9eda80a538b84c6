//! One-time capability detection.

use crate::dom::{HostError, NodeId, TreeEngine};

/// What the host engine can do on its own, measured once at start-up.
///
/// Every other part of the template layer branches on these flags and
/// nothing else, so they never change after [`Capabilities::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The engine has no inert template element of its own.
    pub needs_emulation: bool,
    /// Native templates exist but deep clones lose nested template content.
    pub needs_clone_repair: bool,
    /// Behaviour can be attached through a shared behaviour set; otherwise
    /// each instance needs its own accessor.
    pub behavior_delegation: bool,
    /// Imported fragments must be re-wrapped in a fresh fragment.
    pub rewrap_imported_fragments: bool,
}

impl Capabilities {
    /// Probe `engine`, building throwaway elements in `doc`.
    ///
    /// A probe the engine cannot complete counts as "no native templates".
    pub fn probe<E>(engine: &mut E, doc: NodeId, tag: &str) -> Self
    where
        E: TreeEngine + ?Sized,
    {
        let (needs_emulation, needs_clone_repair) = if engine.has_native_template() {
            match nested_clone_loses_content(engine, doc, tag) {
                Ok(Some(lost)) => (false, lost),
                Ok(None) | Err(_) => (true, false),
            }
        } else {
            (true, false)
        };

        Self {
            needs_emulation,
            needs_clone_repair,
            behavior_delegation: engine.supports_behavior_delegation(),
            rewrap_imported_fragments: engine.has_fragment_import_quirk(),
        }
    }

    /// Whether clone and import have to be intercepted at all.
    #[inline]
    pub const fn patches_cloning(&self) -> bool {
        self.needs_emulation || self.needs_clone_repair
    }
}

/// Clone `<tag><tag><div/></tag></tag>` and check the inner content survived.
///
/// `None` when the engine hands out templates without a content fragment.
fn nested_clone_loses_content<E>(
    engine: &mut E,
    doc: NodeId,
    tag: &str,
) -> Result<Option<bool>, HostError>
where
    E: TreeEngine + ?Sized,
{
    let outer = engine.create_element(doc, tag);
    let inner = engine.create_element(doc, tag);
    let (Some(outer_content), Some(inner_content)) =
        (engine.template_content(outer), engine.template_content(inner))
    else {
        return Ok(None);
    };

    let div = engine.create_element(doc, "div");
    engine.append_child(inner_content, div)?;
    engine.append_child(outer_content, inner)?;

    let copy = engine.clone_node(outer, true)?;
    let inner_copy = engine
        .template_content(copy)
        .and_then(|content| engine.first_child(content));

    let lost = match inner_copy {
        None => true,
        Some(inner_copy) => engine
            .template_content(inner_copy)
            .is_none_or(|content| engine.first_child(content).is_none()),
    };
    Ok(Some(lost))
}
