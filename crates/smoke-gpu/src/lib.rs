//! wgpu implementation of the incense smoke solver.
//!
//! Fields live in `Rgba16Float` render targets arranged as ping-pong pairs.
//! Every operation (step, splat, display) records its passes into one command
//! encoder and submits once.

mod helpers;
mod present;
pub mod programs;
#[cfg(not(target_arch = "wasm32"))]
pub mod readback;
pub mod renderer;
pub mod sim;
mod splat;
pub mod targets;

pub use programs::{ProgramKind, ProgramLibrary};
pub use renderer::SmokeRenderer;
pub use sim::{FluidSim, GpuContext};
pub use targets::{double_target, DoubleTarget, Fields, RenderTarget, FIELD_FORMAT};
