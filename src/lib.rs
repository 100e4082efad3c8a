//! Script front end and render graph runtime.
//!
//! Turns a textual shader/render-graph script into GPU-ready shader stage
//! declarations, then executes the embedded render graph block once per
//! frame against host-supplied context inputs, recording image requests,
//! shader invocations and UI parameter requests as a structured event log.
//! The GPU backend, UI callbacks and any wire serialization live outside
//! this crate.

pub mod context;
pub mod error;
pub mod events;
pub mod include_graph;
pub mod js_engine;
pub mod parser;
pub mod preamble;
pub mod rendergraph;
pub mod shader_desc;
pub mod source_assembler;
pub mod types;

pub use context::{ContextInput, ContextValue, LoadedImageInfo, SWAPCHAIN_SIZE_INPUT, TIME_INPUT};
pub use error::{Error, ScriptException};
pub use events::{
    BoolRequest, CachedImageRequest, ContextRequest, FloatRequest, Image, ImageId, IntRequest,
    LoadedImageRequest, ScriptEvents, ShaderInvocation, TextRequest, UniformValue,
};
pub use shader_desc::{Binding, Declaration, ShaderDesc};
pub use types::{BlendMode, IVec2, IVec3, IVec4, PixelFormat, PodValue, Vec2, Vec3, Vec4};

use include_graph::NodeIdx;
use parser::Block;
use rendergraph::RenderGraphRuntime;
use source_assembler::SourceAssembler;

/// Everything a successful load exposes to the caller: one description per
/// pass block, plus the named reusable fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptContents {
    pub shader_descs: Vec<ShaderDesc>,
    pub declarations: Vec<Declaration>,
}

/// The script engine facade. `load_script` parses, resolves and binds a
/// script; `run_script` then executes its render graph block once per call.
/// All errors cross this boundary as [`ScriptException`] with line numbers
/// in original-script coordinates.
#[derive(Default)]
pub struct ScriptEngine {
    runtime: RenderGraphRuntime,
    assembler: Option<SourceAssembler>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_script(&mut self, source: &str) -> Result<ScriptContents, ScriptException> {
        self.load_script_inner(source)
            .map_err(|e| self.to_exception(e))
    }

    pub fn run_script(&mut self, inputs: &[ContextInput]) -> Result<ScriptEvents, ScriptException> {
        self.runtime.run(inputs).map_err(|e| self.to_exception(e))
    }

    fn load_script_inner(&mut self, source: &str) -> Result<ScriptContents, Error> {
        let script = parser::parse(source)?;
        let direct = include_graph::build_direct_graph(&script.blocks)?;
        let flattened = include_graph::flatten_graph(&direct)?;

        let mut pass_decls = Vec::new();
        let mut shader_descs = Vec::new();
        let mut declarations = Vec::new();
        for (idx, block) in script.blocks.iter().enumerate() {
            if preamble::is_render_graph_block(&block.preamble) {
                continue;
            }
            if let Some(decl) = &block.decl {
                let include_names = flattened[idx]
                    .adjacent
                    .iter()
                    .map(|&dep| declared_block_name(&script.blocks, dep))
                    .collect();
                shader_descs.push(shader_desc::build_shader_desc(
                    decl,
                    include_names,
                    &block.preamble,
                    &block.body,
                ));
                pass_decls.push(decl.clone());
            } else if let Some(name) = preamble::find_declared_name(&block.preamble) {
                declarations.push(Declaration {
                    name: name.to_string(),
                    body: block.body.clone(),
                });
            }
        }

        // The line table is replaced together with the runtime state: a parse
        // or resolution failure above leaves any previously loaded script
        // (and its table) untouched, while a build failure below still needs
        // the new table to remap its diagnostics.
        let assembler = assemble_render_graph(&script.blocks, &flattened);
        let loaded = self.runtime.load(assembler.source(), &pass_decls);
        self.assembler = Some(assembler);
        loaded?;

        Ok(ScriptContents {
            shader_descs,
            declarations,
        })
    }

    fn to_exception(&self, error: Error) -> ScriptException {
        match error {
            Error::Syntax {
                line,
                column,
                message,
            } => ScriptException {
                line,
                column,
                function: String::new(),
                description: message,
            },
            Error::Resolution { line, name } => ScriptException {
                line,
                column: 0,
                function: String::new(),
                description: format!("included block '{name}' does not exist"),
            },
            Error::RecursionLimit => ScriptException {
                line: 0,
                column: 0,
                function: String::new(),
                description: "include graph is too deep, possible include cycle".to_string(),
            },
            Error::Build {
                line,
                column,
                description,
            } => ScriptException {
                line: self.map_assembled_line(line),
                column,
                function: String::new(),
                description,
            },
            Error::Runtime {
                line,
                function,
                description,
            } => ScriptException {
                line: self.map_assembled_line(line),
                column: 0,
                function,
                description,
            },
            Error::NoScriptLoaded => ScriptException {
                line: 0,
                column: 0,
                function: String::new(),
                description: "no script loaded".to_string(),
            },
            Error::Engine(description) => ScriptException {
                line: 0,
                column: 0,
                function: String::new(),
                description,
            },
        }
    }

    fn map_assembled_line(&self, assembled_line: usize) -> usize {
        self.assembler
            .as_ref()
            .and_then(|a| a.map_line(assembled_line))
            .unwrap_or(0)
    }
}

fn declared_block_name(blocks: &[Block], idx: NodeIdx) -> String {
    // Flattened nodes are always include targets, which resolve by name.
    preamble::find_declared_name(&blocks[idx].preamble)
        .unwrap_or_default()
        .to_string()
}

/// Stitch every render graph block and its flattened includes into one
/// module: include bodies at top level (helper definitions), then all render
/// graph bodies concatenated inside a synthetic `main`.
fn assemble_render_graph(blocks: &[Block], flattened: &include_graph::Graph) -> SourceAssembler {
    let mut assembler = SourceAssembler::default();

    for (idx, block) in blocks.iter().enumerate() {
        if !preamble::is_render_graph_block(&block.preamble) {
            continue;
        }
        for &dep in &flattened[idx].adjacent {
            assembler.add_source_block(&blocks[dep].body.text, blocks[dep].body.start);
            assembler.add_non_source_block("\n");
        }
    }

    assembler.add_non_source_block("function main() {\n");
    for block in blocks {
        if !preamble::is_render_graph_block(&block.preamble) {
            continue;
        }
        assembler.add_source_block(&block.body.text, block.body.start);
        assembler.add_non_source_block("\n");
    }
    assembler.add_non_source_block("}\n");

    assembler
}
