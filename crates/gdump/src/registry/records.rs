use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::variant::{self, VariantType};

/// Decoded classes keyed by class name
pub type ClassMap = BTreeMap<String, ClassRecord>;

/// One class of the engine's registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    /// Parent class by name; may be absent from the map
    pub parent: Option<String>,
    pub methods: Vec<MethodRecord>,
    /// Declaration order, which determines layout
    pub properties: Vec<PropertyRecord>,
    /// Total instance size, set by [`compute_layouts`](crate::compute_layouts)
    pub size: Option<u64>,
}

impl ClassRecord {
    pub fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            methods: Vec::new(),
            properties: Vec::new(),
            size: None,
        }
    }
}

/// An exposed method (`MethodBind`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    pub method_id: i32,
    pub arg_count: i32,
    pub default_arg_count: i32,
    pub is_static: bool,
    pub is_const: bool,
    pub has_return: bool,
    /// Raw return type tag; `Variant` when the type array was unreadable
    pub return_type: i32,
    pub arg_types: Vec<i32>,
}

impl MethodRecord {
    /// Return type, or `None` for methods without a return value
    pub fn return_variant(&self) -> Option<i32> {
        self.has_return.then_some(self.return_type)
    }

    pub fn return_type_name(&self) -> &'static str {
        match self.return_variant() {
            Some(tag) => variant::cpp_type_name(tag),
            None => "void",
        }
    }
}

/// An exposed property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    /// Raw `Variant::Type` tag
    pub variant_type: i32,
    /// Byte offset inside the instance, set by layout computation
    pub offset: Option<u64>,
}

impl PropertyRecord {
    pub fn new(name: impl Into<String>, variant_type: i32) -> Self {
        Self {
            name: name.into(),
            variant_type,
            offset: None,
        }
    }

    pub fn known_type(&self) -> Option<VariantType> {
        VariantType::from_tag(self.variant_type)
    }

    pub fn type_name(&self) -> &'static str {
        variant::cpp_type_name(self.variant_type)
    }

    pub fn type_size(&self) -> u64 {
        variant::type_size(self.variant_type)
    }
}
