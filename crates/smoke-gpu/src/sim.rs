//! Simulation stepper: owns the fields and runs one discrete time step as a
//! sequence of render-to-texture passes.

use crate::helpers;
use crate::programs::{ProgramKind, ProgramLibrary};
use crate::targets::{self, Fields, FIELD_FORMAT};
use glam::UVec2;
use smoke_core::{clamp_frame_delta, Lifecycle, SimError, SimulationConfig, SplatUniforms};

/// Device and queue shared by the stepper, injector and compositor.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn request_adapter(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<wgpu::Adapter, SimError> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SimError::NoContext("no compatible GPU adapter".into()))
    }

    pub async fn new(adapter: &wgpu::Adapter) -> Result<Self, SimError> {
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("smoke_device"),
                    required_features: wgpu::Features::empty(),
                    // Downlevel limits, but allow the adapter's full texture size
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| SimError::NoContext(format!("request_device error: {e:?}")))?;
        device.on_uncaptured_error(Box::new(|err| {
            log::error!("[gpu] uncaptured error: {err}");
        }));
        Ok(Self { device, queue })
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct AdvectUniforms {
    texel: [f32; 2],
    dt: f32,
    dissipation: f32,
}

impl AdvectUniforms {
    fn new(target: UVec2, dt: f32, dissipation: f32) -> Self {
        Self {
            texel: texel_size(target),
            dt,
            dissipation,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct GridUniforms {
    texel: [f32; 2],
    _pad: [f32; 2],
}

impl GridUniforms {
    fn new(grid: UVec2) -> Self {
        Self {
            texel: texel_size(grid),
            _pad: [0.0; 2],
        }
    }
}

fn texel_size(size: UVec2) -> [f32; 2] {
    let s = size.max(UVec2::ONE).as_vec2();
    [1.0 / s.x, 1.0 / s.y]
}

/// One buffer per distinct uniform block in a submission. `write_buffer`
/// lands before the whole command buffer runs, so sharing one buffer across
/// passes of the same submit would leave every pass with the last write.
pub(crate) struct UniformBuffers {
    pub(crate) advect_velocity: wgpu::Buffer,
    pub(crate) advect_dye: wgpu::Buffer,
    pub(crate) grid: wgpu::Buffer,
    pub(crate) splat_velocity: wgpu::Buffer,
    pub(crate) splat_dye: wgpu::Buffer,
}

impl UniformBuffers {
    fn new(device: &wgpu::Device) -> Self {
        let make = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self {
            advect_velocity: make("advect_velocity_uniforms", std::mem::size_of::<AdvectUniforms>()),
            advect_dye: make("advect_dye_uniforms", std::mem::size_of::<AdvectUniforms>()),
            grid: make("grid_uniforms", std::mem::size_of::<GridUniforms>()),
            splat_velocity: make("splat_velocity_uniforms", std::mem::size_of::<SplatUniforms>()),
            splat_dye: make("splat_dye_uniforms", std::mem::size_of::<SplatUniforms>()),
        }
    }

    fn destroy(&self) {
        for buffer in [
            &self.advect_velocity,
            &self.advect_dye,
            &self.grid,
            &self.splat_velocity,
            &self.splat_dye,
        ] {
            buffer.destroy();
        }
    }
}

/// Everything released by `dispose`.
pub(crate) struct SimResources {
    pub(crate) programs: ProgramLibrary,
    pub(crate) fields: Fields,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) uniforms: UniformBuffers,
}

/// The GPU fluid solver.
pub struct FluidSim {
    pub(crate) config: SimulationConfig,
    pub(crate) canvas: UVec2,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) resources: Option<SimResources>,
}

impl FluidSim {
    /// Validate `config`, compile every program and allocate every field.
    /// Any failure is fatal and nothing is kept.
    pub async fn new(
        ctx: &GpuContext,
        config: SimulationConfig,
        canvas: UVec2,
        present_format: wgpu::TextureFormat,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let programs = ProgramLibrary::compile(&ctx.device, FIELD_FORMAT, present_format).await?;
        let (grid, dye) = config.grid_sizes(canvas);
        let fields = Fields::allocate_checked(&ctx.device, grid, dye).await?;
        let sampler = targets::create_field_sampler(&ctx.device);
        let uniforms = UniformBuffers::new(&ctx.device);
        log::info!(
            "[sim] ready: canvas {}x{}, {} pressure iterations",
            canvas.x,
            canvas.y,
            config.pressure_iterations
        );
        Ok(Self {
            config,
            canvas,
            lifecycle: Lifecycle::Ready,
            resources: Some(SimResources {
                programs,
                fields,
                sampler,
                uniforms,
            }),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn canvas(&self) -> UVec2 {
        self.canvas
    }

    pub fn fields(&self) -> Option<&Fields> {
        self.resources.as_ref().map(|r| &r.fields)
    }

    /// Velocity/pressure grid size, zero once disposed.
    pub fn grid_size(&self) -> UVec2 {
        self.fields().map_or(UVec2::ZERO, Fields::grid_size)
    }

    pub fn dye_size(&self) -> UVec2 {
        self.fields().map_or(UVec2::ZERO, Fields::dye_size)
    }

    /// Advance by `dt` seconds (clamped to `max_frame_delta`).
    pub fn step(&mut self, ctx: &GpuContext, dt: f32) -> Result<(), SimError> {
        self.lifecycle.begin_step()?;
        let result = self.encode_step(ctx, dt);
        self.lifecycle.end_step();
        result
    }

    fn encode_step(&mut self, ctx: &GpuContext, dt: f32) -> Result<(), SimError> {
        let dt = clamp_frame_delta(dt, self.config.max_frame_delta);
        let cfg = &self.config;
        let SimResources {
            programs,
            fields,
            sampler,
            uniforms,
        } = self.resources.as_mut().ok_or(SimError::Disposed)?;
        let device = &ctx.device;
        let layout = programs.layout();
        let grid = fields.grid_size();

        ctx.queue.write_buffer(
            &uniforms.advect_velocity,
            0,
            bytemuck::bytes_of(&AdvectUniforms::new(grid, dt, cfg.velocity_dissipation)),
        );
        ctx.queue.write_buffer(
            &uniforms.advect_dye,
            0,
            bytemuck::bytes_of(&AdvectUniforms::new(
                fields.dye_size(),
                dt,
                cfg.density_dissipation,
            )),
        );
        ctx.queue
            .write_buffer(&uniforms.grid, 0, bytemuck::bytes_of(&GridUniforms::new(grid)));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fluid_step"),
        });
        let clear = Some(wgpu::Color::TRANSPARENT);

        // 1. velocity advects itself
        {
            let velocity = fields.velocity.read().view();
            let bg = helpers::field_bind_group(
                device,
                "bg_advect_velocity",
                layout,
                &uniforms.advect_velocity,
                sampler,
                velocity,
                velocity,
            );
            helpers::fullscreen_pass(
                &mut encoder,
                "advect_velocity",
                fields.velocity.write().view(),
                clear,
                programs.pipeline(ProgramKind::Advection),
                &bg,
            );
        }
        fields.velocity.swap();

        // 2. dye rides the updated velocity
        {
            let bg = helpers::field_bind_group(
                device,
                "bg_advect_dye",
                layout,
                &uniforms.advect_dye,
                sampler,
                fields.velocity.read().view(),
                fields.dye.read().view(),
            );
            helpers::fullscreen_pass(
                &mut encoder,
                "advect_dye",
                fields.dye.write().view(),
                clear,
                programs.pipeline(ProgramKind::Advection),
                &bg,
            );
        }
        fields.dye.swap();

        // 3. divergence
        {
            let velocity = fields.velocity.read().view();
            let bg = helpers::field_bind_group(
                device,
                "bg_divergence",
                layout,
                &uniforms.grid,
                sampler,
                velocity,
                velocity,
            );
            helpers::fullscreen_pass(
                &mut encoder,
                "divergence",
                fields.divergence.view(),
                clear,
                programs.pipeline(ProgramKind::Divergence),
                &bg,
            );
        }

        // 4. cold start
        helpers::clear_pass(&mut encoder, "clear_pressure", fields.pressure.write().view());
        fields.pressure.swap();

        // 5. Jacobi relaxation
        for _ in 0..cfg.pressure_iterations {
            let bg = helpers::field_bind_group(
                device,
                "bg_pressure",
                layout,
                &uniforms.grid,
                sampler,
                fields.pressure.read().view(),
                fields.divergence.view(),
            );
            helpers::fullscreen_pass(
                &mut encoder,
                "pressure",
                fields.pressure.write().view(),
                clear,
                programs.pipeline(ProgramKind::Pressure),
                &bg,
            );
            fields.pressure.swap();
        }

        // 6. projection
        {
            let bg = helpers::field_bind_group(
                device,
                "bg_gradient",
                layout,
                &uniforms.grid,
                sampler,
                fields.pressure.read().view(),
                fields.velocity.read().view(),
            );
            helpers::fullscreen_pass(
                &mut encoder,
                "gradient_subtract",
                fields.velocity.write().view(),
                clear,
                programs.pipeline(ProgramKind::Gradient),
                &bg,
            );
        }
        fields.velocity.swap();

        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Reallocate every field for `canvas`. New fields start cleared.
    pub fn resize(&mut self, ctx: &GpuContext, canvas: UVec2) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        let resources = self.resources.as_mut().ok_or(SimError::Disposed)?;
        let (grid, dye) = self.config.grid_sizes(canvas);
        let fields = Fields::allocate(&ctx.device, grid, dye)?;
        resources.fields.destroy();
        resources.fields = fields;
        self.canvas = canvas;
        log::info!(
            "[sim] resized to canvas {}x{} (grid {}x{}, dye {}x{})",
            canvas.x,
            canvas.y,
            grid.x,
            grid.y,
            dye.x,
            dye.y
        );
        Ok(())
    }

    /// Destroy textures and buffers and drop the programs. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.fields.destroy();
            resources.uniforms.destroy();
            log::info!("[sim] disposed");
        }
        self.lifecycle = Lifecycle::Disposed;
    }
}
