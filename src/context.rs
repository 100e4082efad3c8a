//! Host-supplied, per-frame named values and the typed stores they land in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{IVec2, IVec3, IVec4, PixelFormat, Vec2, Vec3, Vec4};

/// Name of the ivec2 input carrying the current frame target size.
pub const SWAPCHAIN_SIZE_INPUT: &str = "@swapchain_size";
/// Name of the float input carrying the current time in seconds.
pub const TIME_INPUT: &str = "@time";

/// Metadata for an image the host has loaded on the script's behalf, keyed
/// by filename in the context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadedImageInfo {
    pub size: IVec2,
    pub pixel_format: PixelFormat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Bool(bool),
    LoadedImage(LoadedImageInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextInput {
    pub name: String,
    pub value: ContextValue,
}

impl ContextInput {
    pub fn new(name: impl Into<String>, value: ContextValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One map per value type. UI parameter state lives here between runs;
/// `@`-prefixed entries are refreshed by the host every frame. The serde
/// shape of this struct is what the host shim receives as `ctx`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptContext {
    pub floats: HashMap<String, f32>,
    pub ints: HashMap<String, i32>,
    pub bools: HashMap<String, bool>,
    pub vec2s: HashMap<String, Vec2>,
    pub vec3s: HashMap<String, Vec3>,
    pub vec4s: HashMap<String, Vec4>,
    pub ivec2s: HashMap<String, IVec2>,
    pub ivec3s: HashMap<String, IVec3>,
    pub ivec4s: HashMap<String, IVec4>,
    pub loaded_images: HashMap<String, LoadedImageInfo>,
}

impl ScriptContext {
    /// Store one input in its type's map. Last writer wins per name.
    pub fn apply(&mut self, input: &ContextInput) {
        let name = input.name.clone();
        match input.value {
            ContextValue::Float(v) => {
                self.floats.insert(name, v);
            }
            ContextValue::Vec2(v) => {
                self.vec2s.insert(name, v);
            }
            ContextValue::Vec3(v) => {
                self.vec3s.insert(name, v);
            }
            ContextValue::Vec4(v) => {
                self.vec4s.insert(name, v);
            }
            ContextValue::Int(v) => {
                self.ints.insert(name, v);
            }
            ContextValue::IVec2(v) => {
                self.ivec2s.insert(name, v);
            }
            ContextValue::IVec3(v) => {
                self.ivec3s.insert(name, v);
            }
            ContextValue::IVec4(v) => {
                self.ivec4s.insert(name, v);
            }
            ContextValue::Bool(v) => {
                self.bools.insert(name, v);
            }
            ContextValue::LoadedImage(v) => {
                self.loaded_images.insert(name, v);
            }
        }
    }

    pub fn swapchain_size(&self) -> IVec2 {
        self.ivec2s
            .get(SWAPCHAIN_SIZE_INPUT)
            .copied()
            .unwrap_or_default()
    }

    pub fn time(&self) -> f32 {
        self.floats.get(TIME_INPUT).copied().unwrap_or(0.0)
    }
}
