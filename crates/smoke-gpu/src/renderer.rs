use crate::sim::{FluidSim, GpuContext};
use glam::UVec2;
use smoke_core::{FluidEngine, Impulse, Lifecycle, SimError, SimulationConfig};

/// A `FluidSim` bound to a presentable surface (canvas or window).
pub struct SmokeRenderer<'w> {
    surface: wgpu::Surface<'w>,
    surface_config: wgpu::SurfaceConfiguration,
    ctx: GpuContext,
    sim: FluidSim,
}

impl<'w> SmokeRenderer<'w> {
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'w>,
        canvas: UVec2,
        config: SimulationConfig,
    ) -> Result<Self, SimError> {
        let adapter = GpuContext::request_adapter(instance, Some(&surface)).await?;
        let info = adapter.get_info();
        log::info!("[renderer] adapter: {} ({:?})", info.name, info.backend);
        let ctx = GpuContext::new(&adapter).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_surface_format(&caps.formats)
            .ok_or_else(|| SimError::NoContext("surface reports no formats".into()))?;
        let size = canvas.max(UVec2::ONE);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.x,
            height: size.y,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: pick_alpha_mode(&caps.alpha_modes),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &surface_config);

        let sim = FluidSim::new(&ctx, config, size, format).await?;
        Ok(Self {
            surface,
            surface_config,
            ctx,
            sim,
        })
    }

    pub fn sim(&self) -> &FluidSim {
        &self.sim
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.ctx.device, &self.surface_config);
    }
}

impl FluidEngine for SmokeRenderer<'_> {
    fn lifecycle(&self) -> Lifecycle {
        self.sim.lifecycle()
    }

    fn step(&mut self, dt: f32) -> Result<(), SimError> {
        self.sim.step(&self.ctx, dt)
    }

    fn splat(&mut self, impulse: &Impulse) -> Result<(), SimError> {
        self.sim.splat(&self.ctx, impulse)
    }

    fn render(&mut self) -> Result<(), SimError> {
        self.sim.lifecycle().ensure_ready()?;
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("[renderer] surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("[renderer] surface timeout, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(SimError::Surface(err.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.sim.render_to(&self.ctx, &view)?;
        frame.present();
        Ok(())
    }

    fn resize(&mut self, canvas: UVec2) -> Result<(), SimError> {
        self.sim.lifecycle().ensure_ready()?;
        let size = canvas.max(UVec2::ONE);
        self.surface_config.width = size.x;
        self.surface_config.height = size.y;
        self.reconfigure();
        self.sim.resize(&self.ctx, size)
    }

    fn dispose(&mut self) {
        self.sim.dispose();
    }
}

/// Plain (non-sRGB) 8-bit formats first: dye values are written as-is.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| {
            matches!(
                f,
                wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm
            )
        })
        .or_else(|| formats.first().copied())
}

/// The compositor emits premultiplied color, so prefer a surface that
/// blends it as such over the page.
fn pick_alpha_mode(modes: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    if modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    }
}
