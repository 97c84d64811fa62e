use crate::lifecycle::Lifecycle;
use std::fmt;

/// Rejected `SimulationConfig` values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("emitter speed range is inverted: {min} > {max}")]
    InvertedSpeedRange { min: f32, max: f32 },
}

/// Pipeline stage a shader module was compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Everything the simulation can fail with.
///
/// The initialization variants (`Config` through `IncompleteFramebuffer`) are
/// fatal: the host logs them and shows a blank canvas. Once an engine is
/// `Ready`, only lifecycle misuse (`NotReady`, `Disposed`) and presentation
/// (`Surface`) can fail.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("no GPU context: {0}")]
    NoContext(String),
    #[error("[{program}] {stage} shader failed to compile: {log}")]
    ShaderCompile {
        program: &'static str,
        stage: ShaderStage,
        log: String,
    },
    #[error("[{program}] program failed to link: {log}")]
    ProgramLink { program: &'static str, log: String },
    #[error("framebuffer `{label}` ({width}x{height}) is incomplete: {reason}")]
    IncompleteFramebuffer {
        label: String,
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("simulation is not ready (state: {0:?})")]
    NotReady(Lifecycle),
    #[error("simulation has been disposed")]
    Disposed,
    #[error("surface error: {0}")]
    Surface(String),
}

impl SimError {
    /// True for errors that abort initialization.
    pub fn is_fatal_init(&self) -> bool {
        matches!(
            self,
            SimError::Config(_)
                | SimError::NoContext(_)
                | SimError::ShaderCompile { .. }
                | SimError::ProgramLink { .. }
                | SimError::IncompleteFramebuffer { .. }
        )
    }
}
