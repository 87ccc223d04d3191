//! Field identifier codec.
//!
//! Derives the canonical, flat field identifier used as the index key from a
//! dictionary attribute's namespace/name components:
//!
//! ```text
//! class_ns:ClassName/attr_ns:attr_name
//! ```
//!
//! The same function is used when ingesting dictionaries and when extracting
//! field names from documents, so the two always agree.

use crate::error::{Error, Result};

/// Separator between a namespace and a name.
pub const NS_SEPARATOR: char = ':';

/// Separator between the class part and the attribute part.
pub const ATTR_SEPARATOR: char = '/';

/// Build a field identifier from its four components.
///
/// Components must be non-empty and must not contain either separator; under
/// that precondition distinct component tuples never produce the same
/// identifier.
///
/// # Examples
///
/// ```
/// use regmgr_core::util::ids::field_id;
///
/// assert_eq!(
///     field_id("pds", "Target_Identification", "pds", "name").unwrap(),
///     "pds:Target_Identification/pds:name"
/// );
/// assert!(field_id("pds", "A/B", "pds", "name").is_err());
/// ```
pub fn field_id(class_ns: &str, class_name: &str, attr_ns: &str, attr_name: &str) -> Result<String> {
    for (label, value) in [
        ("class namespace", class_ns),
        ("class name", class_name),
        ("attribute namespace", attr_ns),
        ("attribute name", attr_name),
    ] {
        check_component(label, value)?;
    }

    Ok(format!(
        "{class_ns}{NS_SEPARATOR}{class_name}{ATTR_SEPARATOR}{attr_ns}{NS_SEPARATOR}{attr_name}"
    ))
}

fn check_component(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation_field(label, format!("Empty {label}")));
    }
    if value.contains(NS_SEPARATOR) || value.contains(ATTR_SEPARATOR) {
        return Err(Error::validation_field(
            label,
            format!(
                "Invalid {label} '{value}': must not contain '{NS_SEPARATOR}' or '{ATTR_SEPARATOR}'"
            ),
        ));
    }
    Ok(())
}
