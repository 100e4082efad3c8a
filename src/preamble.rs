//! Pure lookups over a block's preamble sections, used while classifying
//! blocks during script loading.

use crate::parser::PreambleSection;
use crate::types::BlendMode;

/// The block's declared name, if any. The first `declaration` section wins;
/// duplicates are not rejected.
pub fn find_declared_name(preamble: &[PreambleSection]) -> Option<&str> {
    preamble.iter().find_map(|section| match section {
        PreambleSection::Declaration { name } => Some(name.as_str()),
        _ => None,
    })
}

/// All included names across every `include` section, in declaration order.
/// Duplicates are preserved.
pub fn find_includes(preamble: &[PreambleSection]) -> Vec<String> {
    preamble
        .iter()
        .flat_map(|section| match section {
            PreambleSection::Include { names } => names.as_slice(),
            _ => [].as_slice(),
        })
        .cloned()
        .collect()
}

pub fn is_render_graph_block(preamble: &[PreambleSection]) -> bool {
    preamble
        .iter()
        .any(|section| matches!(section, PreambleSection::Rendergraph))
}

/// The last `blendmode` section wins; `opaque` when absent.
pub fn find_blend_mode(preamble: &[PreambleSection]) -> BlendMode {
    preamble
        .iter()
        .rev()
        .find_map(|section| match section {
            PreambleSection::BlendMode(mode) => Some(*mode),
            _ => None,
        })
        .unwrap_or_default()
}
