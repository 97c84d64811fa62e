//! Host-agnostic frame loop.
//!
//! The web and native front-ends own the actual scheduling (requestAnimationFrame,
//! `setInterval`, winit redraws). They call into `FrameDriver` from those
//! callbacks; anything that arrives between frames (pointer splats, timer
//! emissions, resizes) is queued here and applied at the next frame boundary.

use crate::clock::FrameClock;
use crate::config::SimulationConfig;
use crate::constants::MAX_PENDING_IMPULSES;
use crate::engine::FluidEngine;
use crate::error::SimError;
use crate::impulse::{Impulse, ImpulseBatch, IncenseEmitter};
use glam::UVec2;
use instant::Instant;
use std::collections::VecDeque;
use std::time::Duration;

/// Whether the host should schedule another frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Halted,
}

pub struct FrameDriver<E: FluidEngine> {
    engine: E,
    clock: FrameClock,
    emitter: Option<IncenseEmitter>,
    pending: VecDeque<Impulse>,
    canvas: UVec2,
    running: bool,
    disposed: bool,
    frames: u64,
}

impl<E: FluidEngine> FrameDriver<E> {
    /// Wrap an initialized engine. `canvas` is the size the engine was built for.
    pub fn new(engine: E, config: &SimulationConfig, canvas: UVec2) -> Self {
        Self {
            engine,
            clock: FrameClock::new(config.max_frame_delta),
            emitter: config.emitter.clone().map(IncenseEmitter::new),
            pending: VecDeque::new(),
            canvas,
            running: false,
            disposed: false,
            frames: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        if self.disposed {
            return Err(SimError::Disposed);
        }
        self.engine.lifecycle().ensure_ready()?;
        if !self.running {
            log::info!("[driver] start");
        }
        self.running = true;
        Ok(())
    }

    /// Pause the loop and drop queued splats. The next `start` begins with a
    /// zero delta.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("[driver] stop after {} frames", self.frames);
        }
        self.running = false;
        self.pending.clear();
        self.clock.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Queue an impulse for the next frame. Ignored unless running.
    pub fn queue_impulse(&mut self, impulse: Impulse) {
        if self.disposed || !self.running {
            return;
        }
        self.push_pending(impulse);
    }

    fn push_pending(&mut self, impulse: Impulse) {
        if self.pending.len() >= MAX_PENDING_IMPULSES {
            self.pending.pop_front();
        }
        self.pending.push_back(impulse);
    }

    /// One incense emission, for hosts that run their own interval timer.
    pub fn emit_scheduled(&mut self) {
        if self.disposed || !self.running {
            return;
        }
        if let Some(emitter) = self.emitter.as_mut() {
            let impulse = emitter.emit(self.canvas);
            self.push_pending(impulse);
        }
    }

    /// Emissions due after `elapsed`, for hosts without a separate timer.
    pub fn emit_due(&mut self, elapsed: Duration) {
        if self.disposed || !self.running {
            return;
        }
        if let Some(emitter) = self.emitter.as_mut() {
            let mut batch = ImpulseBatch::new();
            emitter.due(elapsed, self.canvas, &mut batch);
            for impulse in batch {
                self.push_pending(impulse);
            }
        }
    }

    /// Run one frame: apply a pending resize, splat queued impulses, step and
    /// render.
    pub fn frame(&mut self, now: Instant, canvas: UVec2) -> Result<FrameOutcome, SimError> {
        if self.disposed || !self.running {
            return Ok(FrameOutcome::Halted);
        }
        if canvas != self.canvas && canvas.cmpgt(UVec2::ZERO).all() {
            log::debug!(
                "[driver] canvas {}x{} -> {}x{}",
                self.canvas.x,
                self.canvas.y,
                canvas.x,
                canvas.y
            );
            self.engine.resize(canvas)?;
            self.canvas = canvas;
        }
        let dt = self.clock.tick(now);
        while let Some(impulse) = self.pending.pop_front() {
            self.engine.splat(&impulse)?;
        }
        self.engine.step(dt)?;
        self.engine.render()?;
        self.frames += 1;
        Ok(FrameOutcome::Continue)
    }

    /// Stop, drop queued work and release the engine's resources.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.running = false;
        self.disposed = true;
        self.pending.clear();
        self.emitter = None;
        self.engine.dispose();
        log::info!("[driver] disposed after {} frames", self.frames);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn canvas(&self) -> UVec2 {
        self.canvas
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn has_emitter(&self) -> bool {
        self.emitter.is_some()
    }

    pub fn emit_interval(&self) -> Option<Duration> {
        self.emitter.as_ref().map(IncenseEmitter::interval)
    }
}
