//! CPU mirror of the GPU passes.
//!
//! `ReferenceFluid` runs the same advection, divergence, Jacobi, gradient,
//! splat and display math as the WGSL programs, texel for texel, with `f32`
//! storage and bilinear clamp-to-edge sampling. It backs the property tests and
//! gives hosts without a GPU adapter something to drive.

use crate::clock::clamp_frame_delta;
use crate::config::SimulationConfig;
use crate::engine::FluidEngine;
use crate::error::SimError;
use crate::impulse::{Impulse, SplatUniforms};
use crate::lifecycle::Lifecycle;
use crate::pingpong::PingPong;
use glam::{UVec2, Vec2, Vec4, Vec4Swizzles};

/// A 2D RGBA field. Row 0 is the bottom of the field (y up).
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width: u32,
    height: u32,
    data: Vec<Vec4>,
}

impl Field {
    /// Zeroed field.
    pub fn new(size: UVec2) -> Self {
        Self {
            width: size.x,
            height: size.y,
            data: vec![Vec4::ZERO; (size.x * size.y) as usize],
        }
    }

    /// Wrap existing texels, e.g. a GPU readback. `None` if the length is wrong.
    pub fn from_texels(size: UVec2, data: Vec<Vec4>) -> Option<Self> {
        if data.len() != (size.x * size.y) as usize {
            return None;
        }
        Some(Self {
            width: size.x,
            height: size.y,
            data,
        })
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.data
    }

    /// Texel at integer coordinates, clamped to the edge.
    pub fn texel(&self, x: i32, y: i32) -> Vec4 {
        if self.data.is_empty() {
            return Vec4::ZERO;
        }
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Vec4) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Bilinear sample with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let p = uv * self.size().as_vec2() - 0.5;
        let base = p.floor();
        let f = p - base;
        let (x, y) = (base.x as i32, base.y as i32);
        let bottom = self.texel(x, y).lerp(self.texel(x + 1, y), f.x);
        let top = self.texel(x, y + 1).lerp(self.texel(x + 1, y + 1), f.x);
        bottom.lerp(top, f.y)
    }

    pub fn texel_size(&self) -> Vec2 {
        Vec2::ONE / self.size().max(UVec2::ONE).as_vec2()
    }

    /// Field-space uv of a texel center.
    pub fn center_uv(&self, x: u32, y: u32) -> Vec2 {
        (Vec2::new(x as f32, y as f32) + 0.5) * self.texel_size()
    }

    /// Sum of squares over the first `channels` components.
    pub fn energy(&self, channels: usize) -> f64 {
        let n = channels.min(4);
        self.data
            .iter()
            .map(|t| {
                t.to_array()[..n]
                    .iter()
                    .map(|c| (*c as f64) * (*c as f64))
                    .sum::<f64>()
            })
            .sum()
    }

    /// Mean of the rgb channels at a texel.
    pub fn intensity(&self, x: u32, y: u32) -> f32 {
        let t = self.texel(x as i32, y as i32);
        (t.x + t.y + t.z) / 3.0
    }

    /// Mean rgb intensity of texels whose centers lie within `radius` (uv) of
    /// `center`. Zero if none do.
    pub fn mean_intensity(&self, center: Vec2, radius: f32) -> f32 {
        let mut sum = 0.0f64;
        let mut count = 0u32;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.center_uv(x, y).distance(center) <= radius {
                    sum += self.intensity(x, y) as f64;
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            (sum / count as f64) as f32
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(Vec4::ZERO);
    }

    fn fill(&mut self, mut shade: impl FnMut(Vec2) -> Vec4) {
        let texel = self.texel_size();
        for y in 0..self.height {
            for x in 0..self.width {
                let uv = (Vec2::new(x as f32, y as f32) + 0.5) * texel;
                self.data[(y * self.width + x) as usize] = shade(uv);
            }
        }
    }
}

fn advect(velocity: &Field, source: &Field, dst: &mut Field, dt: f32, dissipation: f32) {
    let texel = dst.texel_size();
    dst.fill(|uv| {
        let coord = uv - dt * velocity.sample(uv).xy() * texel;
        source.sample(coord) * dissipation
    });
}

fn divergence(velocity: &Field, dst: &mut Field) {
    let texel = velocity.texel_size();
    dst.fill(|uv| {
        let l = velocity.sample(uv - Vec2::new(texel.x, 0.0)).x;
        let r = velocity.sample(uv + Vec2::new(texel.x, 0.0)).x;
        let b = velocity.sample(uv - Vec2::new(0.0, texel.y)).y;
        let t = velocity.sample(uv + Vec2::new(0.0, texel.y)).y;
        Vec4::new(0.5 * (r - l + t - b), 0.0, 0.0, 1.0)
    });
}

fn jacobi(pressure: &Field, divergence: &Field, dst: &mut Field) {
    let texel = pressure.texel_size();
    dst.fill(|uv| {
        let l = pressure.sample(uv - Vec2::new(texel.x, 0.0)).x;
        let r = pressure.sample(uv + Vec2::new(texel.x, 0.0)).x;
        let b = pressure.sample(uv - Vec2::new(0.0, texel.y)).x;
        let t = pressure.sample(uv + Vec2::new(0.0, texel.y)).x;
        let div = divergence.sample(uv).x;
        Vec4::new((l + r + b + t - div) * 0.25, 0.0, 0.0, 1.0)
    });
}

fn subtract_gradient(pressure: &Field, velocity: &Field, dst: &mut Field) {
    let texel = pressure.texel_size();
    dst.fill(|uv| {
        let l = pressure.sample(uv - Vec2::new(texel.x, 0.0)).x;
        let r = pressure.sample(uv + Vec2::new(texel.x, 0.0)).x;
        let b = pressure.sample(uv - Vec2::new(0.0, texel.y)).x;
        let t = pressure.sample(uv + Vec2::new(0.0, texel.y)).x;
        let v = velocity.sample(uv).xy() - Vec2::new(r - l, t - b);
        Vec4::new(v.x, v.y, 0.0, 1.0)
    });
}

fn splat(base: &Field, dst: &mut Field, uniforms: &SplatUniforms) {
    let color = Vec4::from_array(uniforms.color).xyz();
    dst.fill(|uv| {
        let rgb = base.sample(uv).xyz() + uniforms.weight(uv) * color;
        rgb.extend(1.0)
    });
}

/// Display program over a transparent clear with `src-alpha, 1-src-alpha`.
fn composite(dye: &Field, frame: &mut Field) {
    frame.fill(|uv| {
        let c = dye.sample(uv).xyz();
        let a = c.max_element();
        (c * a).extend(a)
    });
}

/// CPU implementation of `FluidEngine`.
#[derive(Clone, Debug)]
pub struct ReferenceFluid {
    config: SimulationConfig,
    canvas: UVec2,
    lifecycle: Lifecycle,
    velocity: PingPong<Field>,
    dye: PingPong<Field>,
    divergence: Field,
    pressure: PingPong<Field>,
    frame: Field,
}

impl ReferenceFluid {
    pub fn new(config: SimulationConfig, canvas: UVec2) -> Result<Self, SimError> {
        config.validate()?;
        let mut sim = Self {
            config,
            canvas,
            lifecycle: Lifecycle::Uninitialized,
            velocity: PingPong::from_fn(|_| Field::new(UVec2::ZERO)),
            dye: PingPong::from_fn(|_| Field::new(UVec2::ZERO)),
            divergence: Field::new(UVec2::ZERO),
            pressure: PingPong::from_fn(|_| Field::new(UVec2::ZERO)),
            frame: Field::new(UVec2::ZERO),
        };
        sim.allocate(canvas);
        sim.lifecycle = Lifecycle::Ready;
        Ok(sim)
    }

    fn allocate(&mut self, canvas: UVec2) {
        let (grid, dye) = self.config.grid_sizes(canvas);
        self.velocity = PingPong::from_fn(|_| Field::new(grid));
        self.dye = PingPong::from_fn(|_| Field::new(dye));
        self.divergence = Field::new(grid);
        self.pressure = PingPong::from_fn(|_| Field::new(grid));
        self.frame = Field::new(canvas.max(UVec2::ONE));
        self.canvas = canvas;
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn canvas(&self) -> UVec2 {
        self.canvas
    }

    pub fn grid_size(&self) -> UVec2 {
        self.velocity.read().size()
    }

    pub fn dye_size(&self) -> UVec2 {
        self.dye.read().size()
    }

    pub fn velocity(&self) -> &PingPong<Field> {
        &self.velocity
    }

    pub fn dye(&self) -> &PingPong<Field> {
        &self.dye
    }

    pub fn pressure(&self) -> &PingPong<Field> {
        &self.pressure
    }

    pub fn divergence(&self) -> &Field {
        &self.divergence
    }

    /// Last composited frame, canvas-sized, premultiplied rgb plus alpha.
    pub fn frame(&self) -> &Field {
        &self.frame
    }

    fn run_step(&mut self, dt: f32) {
        let cfg = &self.config;

        let (read, write) = self.velocity.split_mut();
        advect(read, read, write, dt, cfg.velocity_dissipation);
        self.velocity.swap();

        let (read, write) = self.dye.split_mut();
        advect(self.velocity.read(), read, write, dt, cfg.density_dissipation);
        self.dye.swap();

        divergence(self.velocity.read(), &mut self.divergence);

        self.pressure.write_mut().clear();
        self.pressure.swap();

        for _ in 0..cfg.pressure_iterations {
            let (read, write) = self.pressure.split_mut();
            jacobi(read, &self.divergence, write);
            self.pressure.swap();
        }

        let (read, write) = self.velocity.split_mut();
        subtract_gradient(self.pressure.read(), read, write);
        self.velocity.swap();
    }
}

impl FluidEngine for ReferenceFluid {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn step(&mut self, dt: f32) -> Result<(), SimError> {
        self.lifecycle.begin_step()?;
        let dt = clamp_frame_delta(dt, self.config.max_frame_delta);
        self.run_step(dt);
        self.lifecycle.end_step();
        Ok(())
    }

    fn splat(&mut self, impulse: &Impulse) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        let (velocity, dye) =
            SplatUniforms::for_impulse(impulse, self.canvas, self.config.splat_radius);

        let (read, write) = self.velocity.split_mut();
        splat(read, write, &velocity);
        self.velocity.swap();

        let (read, write) = self.dye.split_mut();
        splat(read, write, &dye);
        self.dye.swap();
        Ok(())
    }

    fn render(&mut self) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        composite(self.dye.read(), &mut self.frame);
        Ok(())
    }

    fn resize(&mut self, canvas: UVec2) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        self.allocate(canvas);
        Ok(())
    }

    fn dispose(&mut self) {
        if self.lifecycle.is_disposed() {
            return;
        }
        self.allocate(UVec2::ZERO);
        self.lifecycle = Lifecycle::Disposed;
    }
}
