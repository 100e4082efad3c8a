//! Conversion of pass declarations into the externally consumable shader
//! interface description.

use crate::parser::{ArgKind, BlockBody, PassDecl, PreambleSection};
use crate::preamble;
use crate::types::{BlendMode, PodAccess};

/// One named interface slot, with the type spelled the way the declaration
/// spelled it (`vec4`, `sampler2D`, ...), ready for downstream shader-source
/// generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: String,
    pub name: String,
}

/// The GPU-backend-facing description of one pass: its interface slots, blend
/// state, resolved include names, and raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDesc {
    pub name: String,
    /// Flattened dependency names in closure order; one entry per reference
    /// path, duplicates preserved.
    pub includes: Vec<String>,
    pub blend_mode: BlendMode,
    pub body: BlockBody,
    pub samplers: Vec<Binding>,
    pub uniforms: Vec<Binding>,
    pub images: Vec<Binding>,
    pub ins: Vec<Binding>,
    pub outs: Vec<Binding>,
}

/// A named source fragment that is neither a pass nor a render graph block,
/// addressable from `include` sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub body: BlockBody,
}

pub fn build_shader_desc(
    decl: &PassDecl,
    includes: Vec<String>,
    preamble: &[PreambleSection],
    body: &BlockBody,
) -> ShaderDesc {
    let mut desc = ShaderDesc {
        name: decl.name.clone(),
        includes,
        blend_mode: preamble::find_blend_mode(preamble),
        body: body.clone(),
        samplers: Vec::new(),
        uniforms: Vec::new(),
        images: Vec::new(),
        ins: Vec::new(),
        outs: Vec::new(),
    };

    for arg in &decl.arg_descs {
        match &arg.kind {
            ArgKind::Pod { ty, access } => {
                let binding = Binding {
                    ty: ty.as_str().to_string(),
                    name: arg.name.clone(),
                };
                if access.unwrap_or(PodAccess::In) == PodAccess::Out {
                    desc.outs.push(binding);
                } else {
                    desc.uniforms.push(binding);
                }
            }
            ArgKind::Sampler(ty) => desc.samplers.push(Binding {
                ty: ty.as_str().to_string(),
                name: arg.name.clone(),
            }),
            // Storage image arguments are accepted by the grammar but do not
            // produce an interface slot yet.
            ArgKind::Image { .. } => {}
        }
    }

    desc
}
