//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#false() -> bool {
    false
}

/// Element name that carries inert content.
pub fn tag() -> String {
    "template".into()
}
