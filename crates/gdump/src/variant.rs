//! Engine `Variant::Type` tags.
//!
//! Tags are stored raw (`i32`) on decoded records since memory may hold
//! values outside the known range. These helpers map a tag to its C++
//! type name and the byte size used for field layout.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

/// Size used for tags without an explicit entry
pub const DEFAULT_TYPE_SIZE: u64 = 8;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    IntoStaticStr,
    Display,
    EnumIter,
)]
#[repr(i32)]
pub enum VariantType {
    #[strum(serialize = "Variant")]
    Nil = 0,
    #[strum(serialize = "bool")]
    Bool = 1,
    #[strum(serialize = "int64_t")]
    Int = 2,
    #[strum(serialize = "double")]
    Float = 3,
    String = 4,
    Vector2 = 5,
    Vector2i = 6,
    Rect2 = 7,
    Rect2i = 8,
    Vector3 = 9,
    Vector3i = 10,
    Transform2D = 11,
    Vector4 = 12,
    Vector4i = 13,
    Plane = 14,
    Quaternion = 15,
    #[strum(serialize = "AABB")]
    Aabb = 16,
    Basis = 17,
    Transform3D = 18,
    Projection = 19,
    Color = 20,
    StringName = 21,
    NodePath = 22,
    #[strum(serialize = "RID")]
    Rid = 23,
    #[strum(serialize = "Object*")]
    Object = 24,
    Callable = 25,
    Signal = 26,
    Dictionary = 27,
    Array = 28,
    PackedByteArray = 29,
    PackedInt32Array = 30,
    PackedInt64Array = 31,
    PackedFloat32Array = 32,
    PackedFloat64Array = 33,
    PackedStringArray = 34,
    PackedVector2Array = 35,
    PackedVector3Array = 36,
    PackedColorArray = 37,
    PackedVector4Array = 38,
}

impl VariantType {
    pub fn from_tag(tag: i32) -> Option<Self> {
        Self::from_repr(tag)
    }

    /// C++ spelling of the type
    pub fn cpp_name(&self) -> &'static str {
        self.into()
    }

    /// In-object size in bytes
    pub fn size(&self) -> u64 {
        match self {
            Self::Nil => 24,
            Self::Bool => 1,
            Self::Int | Self::Float | Self::String => 8,
            Self::Vector2 | Self::Vector2i => 8,
            Self::Rect2 | Self::Rect2i => 16,
            Self::Vector3 | Self::Vector3i => 12,
            Self::Transform2D => 24,
            Self::Vector4 | Self::Vector4i | Self::Plane | Self::Quaternion => 16,
            Self::Aabb => 24,
            Self::Basis => 36,
            Self::Transform3D => 48,
            Self::Projection => 64,
            Self::Color => 16,
            Self::StringName | Self::NodePath | Self::Rid | Self::Object => 8,
            Self::Callable | Self::Signal => 16,
            Self::Dictionary | Self::Array => 8,
            // Packed arrays have no measured size
            _ => DEFAULT_TYPE_SIZE,
        }
    }
}

/// C++ type name for a raw tag; unknown tags map to `Variant`
pub fn cpp_type_name(tag: i32) -> &'static str {
    VariantType::from_tag(tag).map_or(VariantType::Nil.cpp_name(), |t| t.cpp_name())
}

/// Layout size for a raw tag; unknown tags use [`DEFAULT_TYPE_SIZE`]
pub fn type_size(tag: i32) -> u64 {
    VariantType::from_tag(tag).map_or(DEFAULT_TYPE_SIZE, |t| t.size())
}
