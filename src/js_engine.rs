//! Thin ownership wrapper around the embedded scripting engine.
//!
//! One `JsEngine` is one V8 isolate. The render graph runtime drops and
//! recreates it on every load, which is what guarantees no binding from a
//! previous pass-declaration set survives.

use anyhow::anyhow;
use deno_core::error::{CoreError, CoreErrorKind, JsError};
use deno_core::{FastStaticString, JsRuntime, RuntimeOptions};

/// A script-attributable failure with 1-based positions relative to the
/// resource the engine compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct JsDiagnostic {
    pub line: usize,
    pub column: usize,
    pub function: String,
    pub description: String,
}

#[derive(Debug)]
pub enum JsEngineError {
    /// The script itself failed to compile or threw.
    Script(JsDiagnostic),
    /// Engine plumbing failed; carries no source position.
    Internal(anyhow::Error),
}

pub struct JsEngine {
    rt: JsRuntime,
    /// Resource name of the user-visible module; diagnostics prefer stack
    /// frames from this resource over host-shim frames.
    user_resource: &'static str,
}

impl JsEngine {
    pub fn new(user_resource: &'static str) -> Self {
        Self {
            rt: JsRuntime::new(RuntimeOptions::default()),
            user_resource,
        }
    }

    /// Compile and run a script for its side effects.
    pub fn execute(&mut self, name: FastStaticString, src: String) -> Result<(), JsEngineError> {
        self.rt
            .execute_script(name, src)
            .map(|_| ())
            .map_err(|e| self.convert(e.into()))
    }

    /// Compile and run a script, deserializing its completion value.
    pub fn eval<T: serde::de::DeserializeOwned>(
        &mut self,
        name: FastStaticString,
        src: String,
    ) -> Result<T, JsEngineError> {
        let value = self
            .rt
            .execute_script(name, src)
            .map_err(|e| self.convert(e.into()))?;

        deno_core::scope!(scope, self.rt);
        let local = deno_core::v8::Local::new(scope, value);
        deno_core::serde_v8::from_v8(scope, local)
            .map_err(|e| JsEngineError::Internal(anyhow!("failed to deserialize script result: {e:?}")))
    }

    fn convert(&self, err: CoreError) -> JsEngineError {
        match *err.0 {
            CoreErrorKind::Js(js_error) => {
                JsEngineError::Script(diagnostic_from(&js_error, self.user_resource))
            }
            other => JsEngineError::Internal(anyhow!("execute_script failed: {other:?}")),
        }
    }
}

fn diagnostic_from(err: &JsError, user_resource: &str) -> JsDiagnostic {
    // The throw site inside user code, if the stack reaches it; the topmost
    // frame otherwise (host shim throws on behalf of the calling line).
    let frame = err
        .frames
        .iter()
        .find(|f| f.file_name.as_deref() == Some(user_resource))
        .or_else(|| err.frames.first());

    JsDiagnostic {
        line: frame
            .and_then(|f| f.line_number)
            .map(|l| l.max(0) as usize)
            .unwrap_or(0),
        column: frame
            .and_then(|f| f.column_number)
            .map(|c| c.max(0) as usize)
            .unwrap_or(0),
        function: frame
            .and_then(|f| f.function_name.clone())
            .unwrap_or_default(),
        description: err.exception_message.clone(),
    }
}
