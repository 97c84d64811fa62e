//! Simulation and emission tuning constants.
//!
//! Defaults for `SimulationConfig` and the incense emitter live here so the
//! presets read as intent instead of magic numbers.

// Largest simulated step; longer frame gaps (tab backgrounding) are clamped to this
pub const MAX_FRAME_DELTA_SEC: f32 = 1.0 / 60.0;

// Square grid resolutions (velocity/pressure vs dye)
pub const DEFAULT_SIM_RESOLUTION: u32 = 128;
pub const DEFAULT_DYE_RESOLUTION: u32 = 512;

// Exponential decay applied once per step, range (0, 1]
pub const DEFAULT_VELOCITY_DISSIPATION: f32 = 0.99;
pub const DEFAULT_DENSITY_DISSIPATION: f32 = 0.98;
pub const INCENSE_VELOCITY_DISSIPATION: f32 = 0.98;

pub const DEFAULT_PRESSURE_ITERATIONS: u32 = 20;

// Gaussian splat falloff, in squared uv units
pub const DEFAULT_SPLAT_RADIUS: f32 = 0.0025;
// Pointer motion (canvas-normalized) to velocity scale
pub const DEFAULT_SPLAT_FORCE: f32 = 6000.0;

// Incense emission
pub const EMIT_INTERVAL_MS: u32 = 60;
pub const EMIT_SPEED_MIN: f32 = 50.0;
pub const EMIT_SPEED_MAX: f32 = 200.0;
pub const SMOKE_GRAY: f32 = 0.2;
// Upper bound on synthetic splats emitted in one catch-up call
pub const EMIT_CATCH_UP_MAX: usize = 4;
// Splats held for the next frame; the oldest are dropped beyond this
pub const MAX_PENDING_IMPULSES: usize = 64;

// Largest accepted downsample shift for canvas-derived grids
pub const MAX_DOWNSAMPLE_SHIFT: u32 = 8;
