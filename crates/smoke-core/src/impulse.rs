use crate::config::EmitterConfig;
use crate::constants::EMIT_CATCH_UP_MAX;
use glam::{UVec2, Vec2, Vec3};
use rand::prelude::*;
use smallvec::SmallVec;
use std::f32::consts::TAU;
use std::time::Duration;

/// A one-shot request to inject momentum and dye. Consumed by `splat`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    /// Canvas pixels, origin top-left, y down.
    pub position: Vec2,
    /// Screen-space velocity (y down).
    pub delta: Vec2,
    pub color: Vec3,
}

impl Impulse {
    pub fn new(position: Vec2, delta: Vec2, color: Vec3) -> Self {
        Self {
            position,
            delta,
            color,
        }
    }

    pub fn at_center(canvas: UVec2, delta: Vec2, color: Vec3) -> Self {
        Self::new(canvas.as_vec2() * 0.5, delta, color)
    }
}

pub type ImpulseBatch = SmallVec<[Impulse; EMIT_CATCH_UP_MAX]>;

/// Uniform block of the splat program (matches `splat.wgsl`).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SplatUniforms {
    /// Field space: x right, y up, `[0, 1]`.
    pub point: [f32; 2],
    pub aspect: f32,
    pub radius: f32,
    pub color: [f32; 4],
}

impl SplatUniforms {
    /// Velocity and dye splat parameters for one impulse.
    ///
    /// Aspect ratio is taken from `canvas` on every call. The velocity content
    /// has its y component negated: screen y points down, field y points up.
    pub fn for_impulse(impulse: &Impulse, canvas: UVec2, radius: f32) -> (Self, Self) {
        let size = canvas.max(UVec2::ONE).as_vec2();
        let point = [
            impulse.position.x / size.x,
            1.0 - impulse.position.y / size.y,
        ];
        let aspect = size.x / size.y;
        let velocity = Self {
            point,
            aspect,
            radius,
            color: [impulse.delta.x, -impulse.delta.y, 0.0, 0.0],
        };
        let dye = Self {
            color: impulse.color.extend(0.0).to_array(),
            ..velocity
        };
        (velocity, dye)
    }

    pub fn point(&self) -> Vec2 {
        Vec2::from(self.point)
    }

    /// Gaussian weight at field-space `uv`.
    #[inline]
    pub fn weight(&self, uv: Vec2) -> f32 {
        let mut p = uv - self.point();
        p.x *= self.aspect;
        (-p.dot(p) / self.radius).exp()
    }
}

/// Turns pointer motion into impulses scaled by `splat_force`.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    /// Record a move to `pos` (canvas px). Returns an impulse once a previous
    /// position is known and the pointer actually moved.
    pub fn move_to(&mut self, pos: Vec2, canvas: UVec2, force: f32, color: Vec3) -> Option<Impulse> {
        let prev = self.last.replace(pos)?;
        let size = canvas.max(UVec2::ONE).as_vec2();
        let delta = (pos - prev) / size * force;
        if delta == Vec2::ZERO {
            return None;
        }
        Some(Impulse::new(pos, delta, color))
    }

    pub fn release(&mut self) {
        self.last = None;
    }
}

/// Timer-driven synthetic smoke source: a fixed point emitting splats in a
/// random direction at a random speed.
#[derive(Clone, Debug)]
pub struct IncenseEmitter {
    config: EmitterConfig,
    rng: StdRng,
    carry: Duration,
}

impl IncenseEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            carry: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms.max(1) as u64)
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// One emission, for hosts with their own interval timer.
    pub fn emit(&mut self, canvas: UVec2) -> Impulse {
        let angle = self.rng.gen::<f32>() * TAU;
        let (lo, hi) = (self.config.speed_min, self.config.speed_max);
        let speed = if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        };
        Impulse::new(
            self.config.origin * canvas.as_vec2(),
            Vec2::from_angle(angle) * speed,
            self.config.color,
        )
    }

    /// Emissions due after `elapsed`, for frame-driven hosts. Missed intervals
    /// beyond `EMIT_CATCH_UP_MAX` are dropped.
    pub fn due(&mut self, elapsed: Duration, canvas: UVec2, out: &mut ImpulseBatch) {
        self.carry += elapsed;
        let interval = self.interval().as_nanos();
        let ticks = self.carry.as_nanos() / interval;
        self.carry = Duration::from_nanos((self.carry.as_nanos() % interval) as u64);
        for _ in 0..ticks.min(EMIT_CATCH_UP_MAX as u128) {
            out.push(self.emit(canvas));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> IncenseEmitter {
        IncenseEmitter::new(EmitterConfig {
            seed: Some(7),
            ..EmitterConfig::default()
        })
    }

    #[test]
    fn splat_point_flips_y_and_velocity() {
        let impulse = Impulse::new(Vec2::new(50.0, 25.0), Vec2::new(3.0, 4.0), Vec3::ONE);
        let (vel, dye) = SplatUniforms::for_impulse(&impulse, UVec2::new(100, 100), 0.01);
        assert_eq!(vel.point, [0.5, 0.75]);
        assert_eq!(vel.color, [3.0, -4.0, 0.0, 0.0]);
        assert_eq!(dye.color, [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(dye.point, vel.point);
    }

    #[test]
    fn aspect_follows_canvas() {
        let impulse = Impulse::at_center(UVec2::new(200, 100), Vec2::ZERO, Vec3::ONE);
        let (wide, _) = SplatUniforms::for_impulse(&impulse, UVec2::new(200, 100), 0.01);
        assert_eq!(wide.aspect, 2.0);
        let (tall, _) = SplatUniforms::for_impulse(&impulse, UVec2::new(100, 200), 0.01);
        assert_eq!(tall.aspect, 0.5);
    }

    #[test]
    fn weight_peaks_at_point() {
        let impulse = Impulse::at_center(UVec2::splat(64), Vec2::ZERO, Vec3::ONE);
        let (s, _) = SplatUniforms::for_impulse(&impulse, UVec2::splat(64), 0.0025);
        assert!((s.weight(Vec2::splat(0.5)) - 1.0).abs() < 1e-6);
        assert!(s.weight(Vec2::new(0.8, 0.5)) < 1e-10);
    }

    #[test]
    fn pointer_needs_two_samples_and_scales_by_force() {
        let mut tracker = PointerTracker::default();
        let canvas = UVec2::new(100, 50);
        assert!(tracker
            .move_to(Vec2::new(10.0, 10.0), canvas, 6000.0, Vec3::ONE)
            .is_none());
        let imp = tracker
            .move_to(Vec2::new(11.0, 10.5), canvas, 6000.0, Vec3::ONE)
            .unwrap();
        assert!((imp.delta.x - 60.0).abs() < 1e-3);
        assert!((imp.delta.y - 60.0).abs() < 1e-3);
        assert!(tracker
            .move_to(Vec2::new(11.0, 10.5), canvas, 6000.0, Vec3::ONE)
            .is_none());
    }

    #[test]
    fn emitter_speed_within_range_and_origin_fixed() {
        let mut emitter = seeded();
        let canvas = UVec2::new(640, 480);
        for _ in 0..100 {
            let imp = emitter.emit(canvas);
            assert_eq!(imp.position, Vec2::new(320.0, 240.0));
            let speed = imp.delta.length();
            assert!(speed >= 50.0 - 1e-3 && speed <= 200.0 + 1e-3, "speed {speed}");
        }
    }

    #[test]
    fn emitter_is_deterministic_with_seed() {
        let mut a = seeded();
        let mut b = seeded();
        for _ in 0..10 {
            assert_eq!(a.emit(UVec2::splat(100)), b.emit(UVec2::splat(100)));
        }
    }

    #[test]
    fn due_accumulates_and_caps_catch_up() {
        let mut emitter = seeded();
        let mut out = ImpulseBatch::new();
        emitter.due(Duration::from_millis(59), UVec2::splat(100), &mut out);
        assert!(out.is_empty());
        emitter.due(Duration::from_millis(2), UVec2::splat(100), &mut out);
        assert_eq!(out.len(), 1);
        out.clear();
        emitter.due(Duration::from_secs(60), UVec2::splat(100), &mut out);
        assert_eq!(out.len(), EMIT_CATCH_UP_MAX);
    }
}
