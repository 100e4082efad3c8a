use thiserror::Error;

/// Internal error taxonomy. Every subsystem reports through one of these
/// variants; the public boundary converts them into a [`ScriptException`]
/// with remapped source coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Grammar violation found by the parser. Positions are 1-based and
    /// always point at the offending token, never at end of input.
    #[error("{line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// An `[include: "..."]` name with no matching `[declaration: "..."]`
    /// anywhere in the script. The line is the including block's body start.
    #[error("{line}: included block '{name}' does not exist")]
    Resolution { line: usize, name: String },

    /// The include graph exceeded the flattening depth cap.
    #[error("include graph is too deep, possible include cycle")]
    RecursionLimit,

    /// The scripting engine rejected the assembled render graph module.
    /// Line/column are relative to the assembled source.
    #[error("{line}:{column}: {description}")]
    Build {
        line: usize,
        column: usize,
        description: String,
    },

    /// The scripting engine threw while executing `main`. The line is
    /// relative to the assembled source.
    #[error("{line}: {function}: {description}")]
    Runtime {
        line: usize,
        function: String,
        description: String,
    },

    /// `run_script` was called before any successful `load_script`.
    #[error("no script loaded")]
    NoScriptLoaded,

    /// A failure inside the engine plumbing itself (marshaling, host shim),
    /// not attributable to any script source position.
    #[error("script engine failure: {0}")]
    Engine(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Engine(err.to_string())
    }
}

/// The one error shape crossing the public API. Line numbers are always in
/// original-script coordinates; assembled-source lines never leak through
/// this type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{line}:{column}] {function}: {description}")]
pub struct ScriptException {
    pub line: usize,
    pub column: usize,
    pub function: String,
    pub description: String,
}
