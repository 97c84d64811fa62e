use crate::constants::*;
use crate::error::ConfigError;
use glam::{UVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// How grid dimensions are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GridSizing {
    /// Square grids of `sim_resolution` and `dye_resolution`.
    #[default]
    Fixed,
    /// Both grids follow the canvas size `>> shift`.
    Downsample { shift: u32 },
}

/// Synthetic "incense" emission point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub interval_ms: u32,
    /// Canvas-normalized position, y down.
    pub origin: Vec2,
    pub speed_min: f32,
    pub speed_max: f32,
    pub color: Vec3,
    pub seed: Option<u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            interval_ms: EMIT_INTERVAL_MS,
            origin: Vec2::splat(0.5),
            speed_min: EMIT_SPEED_MIN,
            speed_max: EMIT_SPEED_MAX,
            color: Vec3::splat(SMOKE_GRAY),
            seed: None,
        }
    }
}

/// Per-session simulation parameters. Set once at initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sim_resolution: u32,
    pub dye_resolution: u32,
    pub grid_sizing: GridSizing,
    pub velocity_dissipation: f32,
    pub density_dissipation: f32,
    pub pressure_iterations: u32,
    pub splat_radius: f32,
    pub splat_force: f32,
    pub max_frame_delta: f32,
    pub emitter: Option<EmitterConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_resolution: DEFAULT_SIM_RESOLUTION,
            dye_resolution: DEFAULT_DYE_RESOLUTION,
            grid_sizing: GridSizing::Fixed,
            velocity_dissipation: DEFAULT_VELOCITY_DISSIPATION,
            density_dissipation: DEFAULT_DENSITY_DISSIPATION,
            pressure_iterations: DEFAULT_PRESSURE_ITERATIONS,
            splat_radius: DEFAULT_SPLAT_RADIUS,
            splat_force: DEFAULT_SPLAT_FORCE,
            max_frame_delta: MAX_FRAME_DELTA_SEC,
            emitter: None,
        }
    }
}

impl SimulationConfig {
    /// Centered gray smoke rising from a fixed point, emitted every 60 ms.
    pub fn incense() -> Self {
        Self {
            velocity_dissipation: INCENSE_VELOCITY_DISSIPATION,
            emitter: Some(EmitterConfig::default()),
            ..Self::default()
        }
    }

    /// Velocity/pressure grid and dye grid dimensions for a canvas.
    pub fn grid_sizes(&self, canvas: UVec2) -> (UVec2, UVec2) {
        match self.grid_sizing {
            GridSizing::Fixed => (
                UVec2::splat(self.sim_resolution),
                UVec2::splat(self.dye_resolution),
            ),
            GridSizing::Downsample { shift } => {
                let grid = UVec2::new(canvas.x >> shift, canvas.y >> shift).max(UVec2::ONE);
                (grid, grid)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_sizing == GridSizing::Fixed {
            at_least_one("sim_resolution", self.sim_resolution)?;
            at_least_one("dye_resolution", self.dye_resolution)?;
        }
        if let GridSizing::Downsample { shift } = self.grid_sizing {
            if shift > MAX_DOWNSAMPLE_SHIFT {
                return Err(ConfigError::OutOfRange {
                    field: "grid_sizing.shift",
                    value: shift as f64,
                    expected: "0..=8",
                });
            }
        }
        unit_interval("velocity_dissipation", self.velocity_dissipation)?;
        unit_interval("density_dissipation", self.density_dissipation)?;
        at_least_one("pressure_iterations", self.pressure_iterations)?;
        positive("splat_radius", self.splat_radius)?;
        positive("max_frame_delta", self.max_frame_delta)?;
        if !(self.splat_force.is_finite() && self.splat_force >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "splat_force",
                value: self.splat_force as f64,
                expected: ">= 0",
            });
        }
        if let Some(emitter) = &self.emitter {
            at_least_one("emitter.interval_ms", emitter.interval_ms)?;
            if !(emitter.speed_min.is_finite() && emitter.speed_min >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field: "emitter.speed_min",
                    value: emitter.speed_min as f64,
                    expected: ">= 0",
                });
            }
            if !emitter.speed_max.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field: "emitter.speed_max",
                    value: emitter.speed_max as f64,
                    expected: "finite",
                });
            }
            if !(emitter.speed_max >= emitter.speed_min) {
                return Err(ConfigError::InvertedSpeedRange {
                    min: emitter.speed_min,
                    max: emitter.speed_max,
                });
            }
        }
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: "(0, 1]",
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: "> 0",
        })
    }
}

fn at_least_one(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: ">= 1",
        })
    }
}
