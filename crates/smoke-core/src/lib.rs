//! Host-agnostic pieces of the incense smoke simulation.
//!
//! Nothing in this crate touches a GPU or a browser API, so everything here
//! builds and tests on the host. The wgpu engine (`smoke-gpu`) and the web and
//! native front-ends consume these types.

pub mod clock;
pub mod config;
pub mod constants;
pub mod driver;
pub mod engine;
pub mod error;
pub mod impulse;
pub mod lifecycle;
pub mod pingpong;
pub mod reference;

pub use clock::{clamp_frame_delta, FrameClock};
pub use config::{EmitterConfig, GridSizing, SimulationConfig};
pub use driver::{FrameDriver, FrameOutcome};
pub use engine::FluidEngine;
pub use error::{ConfigError, ShaderStage, SimError};
pub use impulse::{Impulse, ImpulseBatch, IncenseEmitter, PointerTracker, SplatUniforms};
pub use lifecycle::Lifecycle;
pub use pingpong::PingPong;
pub use reference::{Field, ReferenceFluid};
