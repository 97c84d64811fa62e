//! Compositor: dye to a visible target with alpha from intensity.

use crate::helpers;
use crate::programs::ProgramKind;
use crate::sim::{FluidSim, GpuContext};
use smoke_core::SimError;

impl FluidSim {
    /// Clear `target` to transparent and draw the dye over it with
    /// `src-alpha, 1-src-alpha` blending. Simulation state is untouched.
    pub fn render_to(&self, ctx: &GpuContext, target: &wgpu::TextureView) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        let resources = self.resources.as_ref().ok_or(SimError::Disposed)?;
        let dye = resources.fields.dye.read().view();
        let bg = helpers::field_bind_group(
            &ctx.device,
            "bg_display",
            resources.programs.layout(),
            &resources.uniforms.grid,
            &resources.sampler,
            dye,
            dye,
        );
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fluid_display"),
            });
        helpers::fullscreen_pass(
            &mut encoder,
            "display",
            target,
            Some(wgpu::Color::TRANSPARENT),
            resources.programs.pipeline(ProgramKind::Display),
            &bg,
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
