//! The render graph script runtime.
//!
//! Owns the embedded scripting engine, binds the host-callable surface
//! (sliders, images, context accessors, one wrapper per declared pass),
//! executes the assembled `main` once per frame, and collects the resulting
//! event log. Lifecycle is strict: Unloaded -> Loaded -> (Running)*; every
//! load tears the previous isolate down completely.

use std::fmt::Write as _;

use deno_core::ascii_str;
use serde::{Deserialize, Serialize};

use crate::context::{ContextInput, ScriptContext};
use crate::error::Error;
use crate::events::{
    BoolRequest, CachedImageRequest, ContextRequest, FloatRequest, Image, IntRequest,
    LoadedImageRequest, ScriptEvents, ShaderInvocation, TextRequest,
};
use crate::js_engine::{JsEngine, JsEngineError};
use crate::parser::{ArgDesc, ArgKind, PassDecl};
use crate::types::{IVec2, PixelFormat, PodAccess, PodValue};

const PRELUDE: &str = include_str!("rendergraph_prelude.js");

/// Resource name the assembled user module is compiled under. Diagnostics
/// are filtered to stack frames of this resource.
pub const RENDERGRAPH_RESOURCE: &str = "<rendergraph>";

#[derive(Default)]
pub struct RenderGraphRuntime {
    engine: Option<JsEngine>,
    context: ScriptContext,
}

/// Per-argument marshaling plan handed to the host shim, derived from the
/// declared signature.
#[derive(Serialize)]
struct ArgSpec<'a> {
    kind: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<&'static str>,
    name: &'a str,
}

#[derive(Serialize)]
struct RunPayload<'a> {
    ctx: &'a ScriptContext,
    time: f32,
    swapchain_size: IVec2,
}

/// Wire shape of one event log entry as the host shim records it.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawEvent {
    FloatRequest {
        name: String,
        min_val: f32,
        max_val: f32,
        def_val: f32,
    },
    IntRequest {
        name: String,
        min_val: i32,
        max_val: i32,
        def_val: i32,
    },
    BoolRequest {
        name: String,
        def_val: bool,
    },
    TextRequest {
        text: String,
    },
    LoadedImageRequest {
        filename: String,
        id: usize,
    },
    CachedImageRequest {
        pixel_format: PixelFormat,
        size: IVec2,
        id: usize,
    },
    ShaderInvocation {
        shader_name: String,
        uniforms: Vec<PodValue>,
        image_sampler_bindings: Vec<Image>,
        color_attachments: Vec<Image>,
    },
}

impl RenderGraphRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// Replace whatever was loaded before with the assembled module. The
    /// previous isolate and context are discarded first, so a failed load
    /// leaves the runtime unloaded rather than half-bound.
    pub fn load(&mut self, assembled_source: &str, pass_decls: &[PassDecl]) -> Result<(), Error> {
        self.engine = None;
        self.context = ScriptContext::default();

        let mut engine = JsEngine::new(RENDERGRAPH_RESOURCE);
        engine
            .execute(ascii_str!("<host>"), PRELUDE.to_string())
            .map_err(internal_error)?;
        engine
            .execute(ascii_str!("<host:passes>"), pass_bindings_source(pass_decls)?)
            .map_err(internal_error)?;

        engine
            .execute(ascii_str!("<rendergraph>"), assembled_source.to_string())
            .map_err(|e| match e {
                JsEngineError::Script(d) => Error::Build {
                    line: d.line,
                    column: d.column,
                    description: d.description,
                },
                JsEngineError::Internal(e) => Error::Engine(e.to_string()),
            })?;

        let has_main: bool = engine
            .eval(
                ascii_str!("<host:check>"),
                "typeof globalThis.main === 'function'".to_string(),
            )
            .map_err(internal_error)?;
        if !has_main {
            return Err(Error::Build {
                line: 0,
                column: 0,
                description: "the render graph script does not define a 'main' entry point"
                    .to_string(),
            });
        }

        self.engine = Some(engine);
        Ok(())
    }

    /// One frame: apply inputs, reset the per-run image table and event log,
    /// execute `main` to completion, return what it recorded. Runtime errors
    /// fail this call only; the loaded script stays valid for the next one.
    pub fn run(&mut self, inputs: &[ContextInput]) -> Result<ScriptEvents, Error> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(Error::NoScriptLoaded);
        };

        for input in inputs {
            self.context.apply(input);
        }

        let payload = RunPayload {
            time: self.context.time(),
            swapchain_size: self.context.swapchain_size(),
            ctx: &self.context,
        };
        let call = format!(
            "JSON.stringify(globalThis.__rg.run({}))",
            serde_json::to_string(&payload)?
        );

        let raw_json: String = engine.eval(ascii_str!("<run>"), call).map_err(|e| match e {
            JsEngineError::Script(d) => Error::Runtime {
                line: d.line,
                function: d.function,
                description: d.description,
            },
            JsEngineError::Internal(e) => Error::Engine(e.to_string()),
        })?;
        let raw: Vec<RawEvent> = serde_json::from_str(&raw_json)?;

        let events = collect_events(raw);
        self.seed_context(&events);
        Ok(events)
    }

    /// Remember the stored value behind first-seen slider/checkbox names so
    /// the next frame reads the same value unless an input overrides it.
    fn seed_context(&mut self, events: &ScriptEvents) {
        for request in &events.context_requests {
            match request {
                ContextRequest::Float(r) => {
                    self.context
                        .floats
                        .entry(r.name.clone())
                        .or_insert(r.def_val);
                }
                ContextRequest::Int(r) => {
                    self.context.ints.entry(r.name.clone()).or_insert(r.def_val);
                }
                ContextRequest::Bool(r) => {
                    self.context
                        .bools
                        .entry(r.name.clone())
                        .or_insert(r.def_val);
                }
                ContextRequest::Text(_)
                | ContextRequest::LoadedImage(_)
                | ContextRequest::CachedImage(_) => {}
            }
        }
    }
}

fn internal_error(err: JsEngineError) -> Error {
    match err {
        // A script-shaped failure in the host shim is still our bug, not the
        // user script's.
        JsEngineError::Script(d) => Error::Engine(format!("host shim error: {}", d.description)),
        JsEngineError::Internal(e) => Error::Engine(e.to_string()),
    }
}

/// Script that registers one wrapper per declared pass, mirroring the typed
/// argument list. This is marshaling site one; the shim's `podValue` is the
/// other half of the same closed `ArgKind` set.
fn pass_bindings_source(pass_decls: &[PassDecl]) -> Result<String, Error> {
    let mut src = String::new();
    for decl in pass_decls {
        let specs: Vec<ArgSpec<'_>> = decl.arg_descs.iter().map(arg_spec).collect();
        let _ = writeln!(
            src,
            "globalThis.__rg.definePass({}, {});",
            serde_json::to_string(&decl.name)?,
            serde_json::to_string(&specs)?,
        );
    }
    Ok(src)
}

fn arg_spec(arg: &ArgDesc) -> ArgSpec<'_> {
    match &arg.kind {
        ArgKind::Pod { ty, access } => {
            if access.unwrap_or(PodAccess::In) == PodAccess::Out {
                ArgSpec {
                    kind: "out",
                    ty: None,
                    name: &arg.name,
                }
            } else {
                ArgSpec {
                    kind: "uniform",
                    ty: Some(ty.as_str()),
                    name: &arg.name,
                }
            }
        }
        ArgKind::Sampler(_) => ArgSpec {
            kind: "sampler",
            ty: None,
            name: &arg.name,
        },
        ArgKind::Image { .. } => ArgSpec {
            kind: "image",
            ty: None,
            name: &arg.name,
        },
    }
}

fn collect_events(raw: Vec<RawEvent>) -> ScriptEvents {
    let mut events = ScriptEvents::default();
    for event in raw {
        match event {
            RawEvent::FloatRequest {
                name,
                min_val,
                max_val,
                def_val,
            } => events.context_requests.push(ContextRequest::Float(FloatRequest {
                name,
                min_val,
                max_val,
                def_val,
            })),
            RawEvent::IntRequest {
                name,
                min_val,
                max_val,
                def_val,
            } => events.context_requests.push(ContextRequest::Int(IntRequest {
                name,
                min_val,
                max_val,
                def_val,
            })),
            RawEvent::BoolRequest { name, def_val } => events
                .context_requests
                .push(ContextRequest::Bool(BoolRequest { name, def_val })),
            RawEvent::TextRequest { text } => events
                .context_requests
                .push(ContextRequest::Text(TextRequest { text })),
            RawEvent::LoadedImageRequest { filename, id } => events
                .context_requests
                .push(ContextRequest::LoadedImage(LoadedImageRequest {
                    filename,
                    id,
                })),
            RawEvent::CachedImageRequest {
                pixel_format,
                size,
                id,
            } => events
                .context_requests
                .push(ContextRequest::CachedImage(CachedImageRequest {
                    pixel_format,
                    size,
                    id,
                })),
            RawEvent::ShaderInvocation {
                shader_name,
                uniforms,
                image_sampler_bindings,
                color_attachments,
            } => {
                let mut invocation = ShaderInvocation {
                    shader_name,
                    image_sampler_bindings,
                    color_attachments,
                    ..Default::default()
                };
                for value in uniforms {
                    invocation.add_uniform_value(value);
                }
                events.shader_invocations.push(invocation);
            }
        }
    }
    events
}
