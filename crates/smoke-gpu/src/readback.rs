//! Blocking texture readback for headless checks. Not available on wasm,
//! where buffer mapping cannot be waited on synchronously.

use crate::sim::GpuContext;
use crate::targets::RenderTarget;
use glam::Vec4;
use smoke_core::{Field, SimError};

const BYTES_PER_TEXEL: u32 = 8;

/// Copy `target` back to the host as a `Field`. Row 0 is the bottom of the
/// field, matching the CPU solver.
pub fn read_field(ctx: &GpuContext, target: &RenderTarget) -> Result<Field, SimError> {
    let size = target.size();
    let unpadded = size.x * BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;

    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: (padded * size.y) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: target.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(size.y),
            },
        },
        wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        sender.send(result).ok();
    });
    let _ = ctx.device.poll(wgpu::Maintain::Wait);
    pollster::block_on(receiver.receive())
        .ok_or_else(|| SimError::Surface(format!("readback of `{}` dropped", target.label())))?
        .map_err(|e| SimError::Surface(format!("readback of `{}`: {e}", target.label())))?;

    let mut texels = Vec::with_capacity((size.x * size.y) as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks(padded as usize).take(size.y as usize) {
            for texel in row[..unpadded as usize].chunks_exact(BYTES_PER_TEXEL as usize) {
                let c = |i: usize| f16_to_f32(u16::from_le_bytes([texel[i], texel[i + 1]]));
                texels.push(Vec4::new(c(0), c(2), c(4), c(6)));
            }
        }
    }
    staging.unmap();
    staging.destroy();
    Field::from_texels(size, texels)
        .ok_or_else(|| SimError::Surface(format!("readback of `{}` was short", target.label())))
}

#[inline]
fn f16_to_f32(bits: u16) -> f32 {
    half::f16::from_bits(bits).to_f32()
}
