use crate::error::SimError;
use crate::impulse::Impulse;
use crate::lifecycle::Lifecycle;
use glam::UVec2;

/// What a frame driver needs from a smoke engine.
///
/// Every mutating call takes `&mut self`, so a step can never overlap another
/// step or a splat.
pub trait FluidEngine {
    fn lifecycle(&self) -> Lifecycle;

    /// Advance the simulation by `dt` seconds. Implementations clamp `dt` to
    /// the configured maximum.
    fn step(&mut self, dt: f32) -> Result<(), SimError>;

    /// Inject one impulse into velocity and dye.
    fn splat(&mut self, impulse: &Impulse) -> Result<(), SimError>;

    /// Composite the current dye into the visible surface.
    fn render(&mut self) -> Result<(), SimError>;

    /// Reallocate fields for a new canvas size. Field contents are cleared.
    fn resize(&mut self, canvas: UVec2) -> Result<(), SimError>;

    /// Release every resource. Idempotent.
    fn dispose(&mut self);
}
