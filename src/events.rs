//! The per-frame event log: everything a script run asked of the host.

use serde::{Deserialize, Serialize};

use crate::types::{IVec2, PixelFormat, PodValue};

pub type ImageId = usize;

/// Opaque image handle as seen by script code: an id into the per-run image
/// table plus a half-open mip range. Id 0 is the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub mip_range: IVec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatRequest {
    pub name: String,
    pub min_val: f32,
    pub max_val: f32,
    pub def_val: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntRequest {
    pub name: String,
    pub min_val: i32,
    pub max_val: i32,
    pub def_val: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolRequest {
    pub name: String,
    pub def_val: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedImageRequest {
    pub filename: String,
    pub id: ImageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedImageRequest {
    pub pixel_format: PixelFormat,
    pub size: IVec2,
    pub id: ImageId,
}

/// A UI or resource request recorded during script execution, in call order.
/// Slider/checkbox requests are re-emitted on every call so the host can
/// redraw its controls each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextRequest {
    Float(FloatRequest),
    Int(IntRequest),
    Bool(BoolRequest),
    Text(TextRequest),
    LoadedImage(LoadedImageRequest),
    CachedImage(CachedImageRequest),
}

/// Byte slice of one uniform argument inside [`ShaderInvocation::uniform_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformValue {
    pub offset: usize,
    pub size: usize,
}

/// One recorded call of a declared pass: bound images plus the packed
/// uniform payload in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderInvocation {
    pub shader_name: String,
    pub image_sampler_bindings: Vec<Image>,
    pub color_attachments: Vec<Image>,
    pub uniform_values: Vec<UniformValue>,
    pub uniform_data: Vec<u8>,
}

impl ShaderInvocation {
    /// Append one pod value to the uniform blob, native-endian, recording its
    /// offset/size slice.
    pub fn add_uniform_value(&mut self, value: PodValue) {
        let bytes = value.bytes();
        let offset = self.uniform_data.len();
        self.uniform_data.extend_from_slice(bytes);
        self.uniform_values.push(UniformValue {
            offset,
            size: bytes.len(),
        });
    }
}

/// Everything one `run_script` call produced, fully replaced each run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptEvents {
    pub context_requests: Vec<ContextRequest>,
    pub shader_invocations: Vec<ShaderInvocation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    #[test]
    fn uniform_packing_tracks_offsets() {
        let mut invocation = ShaderInvocation {
            shader_name: "Blur".to_string(),
            ..Default::default()
        };
        invocation.add_uniform_value(PodValue::Float(1.0));
        invocation.add_uniform_value(PodValue::Vec2(Vec2 { x: 3.0, y: 4.0 }));
        invocation.add_uniform_value(PodValue::Int(-7));

        assert_eq!(
            invocation.uniform_values,
            [
                UniformValue { offset: 0, size: 4 },
                UniformValue { offset: 4, size: 8 },
                UniformValue { offset: 12, size: 4 },
            ]
        );
        assert_eq!(invocation.uniform_data.len(), 16);
        assert_eq!(invocation.uniform_data[0..4], 1.0f32.to_ne_bytes()[..]);
        assert_eq!(invocation.uniform_data[4..8], 3.0f32.to_ne_bytes()[..]);
        assert_eq!(invocation.uniform_data[12..16], (-7i32).to_ne_bytes()[..]);
    }
}
