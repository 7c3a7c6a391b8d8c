//! Instance layout reconstruction.
//!
//! Offsets are derived from declaration order alone: each class starts
//! where its parent ends and every property is placed on an 8-byte
//! boundary. Native members the registry does not expose are invisible,
//! so the result is an approximation of the real object layout.

use std::collections::HashSet;

use tracing::debug;

use crate::registry::ClassMap;

/// Size assumed for a root class or an unresolvable parent
pub const BASE_CLASS_SIZE: u64 = 8;

const ALIGNMENT: u64 = 8;

fn align(offset: u64) -> u64 {
    (offset + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Annotate every class with its total size and property offsets.
///
/// Only names, parents and property types are read, so re-running over an
/// already annotated map yields the same result.
///
/// A class counts as being visited before its parent is resolved. In an
/// inheritance cycle the ancestor that closes the loop therefore starts at
/// [`BASE_CLASS_SIZE`] rather than contributing its own properties, so
/// every member of a cycle gets a finite size.
pub fn compute_layouts(classes: &mut ClassMap) {
    let layouts: Vec<(String, u64, Vec<u64>)> = classes
        .keys()
        .map(|name| {
            let mut visiting = HashSet::new();
            let (size, offsets) = class_layout(name, classes, &mut visiting);
            (name.clone(), size, offsets)
        })
        .collect();

    for (name, size, offsets) in layouts {
        if let Some(class) = classes.get_mut(&name) {
            class.size = Some(size);
            for (property, offset) in class.properties.iter_mut().zip(offsets) {
                property.offset = Some(offset);
            }
        }
    }
    debug!("Computed layouts for {} classes", classes.len());
}

/// Total size of `name` and the offsets of its own properties
fn class_layout(name: &str, classes: &ClassMap, visiting: &mut HashSet<String>) -> (u64, Vec<u64>) {
    let Some(class) = classes.get(name) else {
        return (BASE_CLASS_SIZE, Vec::new());
    };
    visiting.insert(name.to_string());

    let base = match class.parent.as_deref() {
        Some(parent) if classes.contains_key(parent) && !visiting.contains(parent) => {
            class_layout(parent, classes, visiting).0
        }
        Some(parent) if visiting.contains(parent) => {
            debug!("Inheritance cycle at {} -> {}", name, parent);
            BASE_CLASS_SIZE
        }
        _ => BASE_CLASS_SIZE,
    };

    let mut offset = base;
    let offsets = class
        .properties
        .iter()
        .map(|property| {
            offset = align(offset);
            let placed = offset;
            offset += property.type_size();
            placed
        })
        .collect();
    (offset, offsets)
}
