//! Impulse injector: additive Gaussian splats into velocity and dye.

use crate::helpers;
use crate::programs::ProgramKind;
use crate::sim::{FluidSim, GpuContext, SimResources};
use crate::targets::DoubleTarget;
use smoke_core::{Impulse, SimError, SplatUniforms};

impl FluidSim {
    /// Inject `impulse`: one splat into velocity, then one into dye, each
    /// followed by a swap. Aspect ratio comes from the current canvas.
    pub fn splat(&mut self, ctx: &GpuContext, impulse: &Impulse) -> Result<(), SimError> {
        self.lifecycle.ensure_ready()?;
        let (velocity_u, dye_u) =
            SplatUniforms::for_impulse(impulse, self.canvas, self.config.splat_radius);
        let SimResources {
            programs,
            fields,
            sampler,
            uniforms,
        } = self.resources.as_mut().ok_or(SimError::Disposed)?;

        ctx.queue
            .write_buffer(&uniforms.splat_velocity, 0, bytemuck::bytes_of(&velocity_u));
        ctx.queue
            .write_buffer(&uniforms.splat_dye, 0, bytemuck::bytes_of(&dye_u));

        let (programs, sampler) = (&*programs, &*sampler);
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fluid_splat"),
            });
        let mut splat_into = |label: &str, target: &mut DoubleTarget, buffer: &wgpu::Buffer| {
            let base = target.read().view();
            let bg = helpers::field_bind_group(
                &ctx.device,
                label,
                programs.layout(),
                buffer,
                sampler,
                base,
                base,
            );
            helpers::fullscreen_pass(
                &mut encoder,
                label,
                target.write().view(),
                Some(wgpu::Color::TRANSPARENT),
                programs.pipeline(ProgramKind::Splat),
                &bg,
            );
            target.swap();
        };
        splat_into("splat_velocity", &mut fields.velocity, &uniforms.splat_velocity);
        splat_into("splat_dye", &mut fields.dye, &uniforms.splat_dye);

        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
