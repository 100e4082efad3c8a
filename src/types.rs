use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Plain-old-data types a pass declaration may use for its return value and
/// arguments. `Void` is only meaningful as a return type but the grammar does
/// not forbid it elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodType {
    Void,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
}

impl PodType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "void" => Self::Void,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "int" => Self::Int,
            "ivec2" => Self::IVec2,
            "ivec3" => Self::IVec3,
            "ivec4" => Self::IVec4,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Int => "int",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
        }
    }
}

/// Access qualifier on a pod argument. Absence means `In`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodAccess {
    In,
    Out,
}

impl PodAccess {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "in" => Self::In,
            "out" => Self::Out,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Image1D,
    Image2D,
    Image3D,
}

impl ImageType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "image1D" => Self::Image1D,
            "image2D" => Self::Image2D,
            "image3D" => Self::Image3D,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image1D => "image1D",
            Self::Image2D => "image2D",
            Self::Image3D => "image3D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl ImageAccess {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "readonly" => Self::ReadOnly,
            "writeonly" => Self::WriteOnly,
            "readwrite" => Self::ReadWrite,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerType {
    Sampler1D,
    Sampler2D,
    Sampler3D,
}

impl SamplerType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "sampler1D" => Self::Sampler1D,
            "sampler2D" => Self::Sampler2D,
            "sampler3D" => Self::Sampler3D,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sampler1D => "sampler1D",
            Self::Sampler2D => "sampler2D",
            Self::Sampler3D => "sampler3D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgba8,
    Rgba16f,
    Rgba32f,
}

impl PixelFormat {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "rgba8" => Self::Rgba8,
            "rgba16f" => Self::Rgba16f,
            "rgba32f" => Self::Rgba32f,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgba8 => "rgba8",
            Self::Rgba16f => "rgba16f",
            Self::Rgba32f => "rgba32f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    AlphaBlend,
    Additive,
    Multiplicative,
}

impl BlendMode {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "opaque" => Self::Opaque,
            "alphablend" => Self::AlphaBlend,
            "additive" => Self::Additive,
            "multiplicative" => Self::Multiplicative,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::AlphaBlend => "alphablend",
            Self::Additive => "additive",
            Self::Multiplicative => "multiplicative",
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct IVec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct IVec4 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

/// A concrete pod value crossing the scripting boundary. The serde
/// representation (`{"type": "vec2", "value": {"x": .., "y": ..}}`) is the
/// wire shape the host shim emits for uniform arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PodValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
}

impl PodValue {
    /// Native-endian byte view of the value, used for uniform packing.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::bytes_of(v),
            Self::Vec2(v) => bytemuck::bytes_of(v),
            Self::Vec3(v) => bytemuck::bytes_of(v),
            Self::Vec4(v) => bytemuck::bytes_of(v),
            Self::Int(v) => bytemuck::bytes_of(v),
            Self::IVec2(v) => bytemuck::bytes_of(v),
            Self::IVec3(v) => bytemuck::bytes_of(v),
            Self::IVec4(v) => bytemuck::bytes_of(v),
        }
    }
}
