use crate::helpers;
use glam::UVec2;
use smoke_core::{PingPong, SimError};

/// Storage format of every simulation field. Velocity and pressure are
/// signed, so an 8-bit unorm format would clamp them.
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// One texture used both as a sampling source and as a color attachment.
#[derive(Debug)]
pub struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: UVec2,
    label: String,
}

impl RenderTarget {
    /// Zero-initialized target of `size` texels.
    pub fn new(device: &wgpu::Device, label: &str, size: UVec2) -> Self {
        let (texture, view) = helpers::create_field_texture(device, label, size, FIELD_FORMAT);
        Self {
            texture,
            view,
            size,
            label: label.to_owned(),
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

pub type DoubleTarget = PingPong<RenderTarget>;

pub fn double_target(device: &wgpu::Device, label: &str, size: UVec2) -> DoubleTarget {
    PingPong::from_fn(|i| RenderTarget::new(device, &format!("{label}_{i}"), size))
}

/// Bilinear, clamp-to-edge on every axis.
pub fn create_field_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("field_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Every field the stepper owns.
///
/// Velocity, divergence and pressure share the simulation grid; dye has its
/// own, usually finer, grid.
#[derive(Debug)]
pub struct Fields {
    pub velocity: DoubleTarget,
    pub dye: DoubleTarget,
    pub divergence: RenderTarget,
    pub pressure: DoubleTarget,
}

impl Fields {
    /// Allocate all fields after checking sizes against device limits.
    pub fn allocate(device: &wgpu::Device, grid: UVec2, dye: UVec2) -> Result<Self, SimError> {
        let max = device.limits().max_texture_dimension_2d;
        check_size("velocity", grid, max)?;
        check_size("dye", dye, max)?;
        Ok(Self {
            velocity: double_target(device, "velocity", grid),
            dye: double_target(device, "dye", dye),
            divergence: RenderTarget::new(device, "divergence", grid),
            pressure: double_target(device, "pressure", grid),
        })
    }

    /// `allocate` with device errors captured, so a target the backend
    /// rejects surfaces as `IncompleteFramebuffer` instead of an uncaptured
    /// validation error.
    pub async fn allocate_checked(
        device: &wgpu::Device,
        grid: UVec2,
        dye: UVec2,
    ) -> Result<Self, SimError> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let fields = Self::allocate(device, grid, dye);
        let validation = device.pop_error_scope().await;
        let oom = device.pop_error_scope().await;
        let fields = fields?;
        if let Some(err) = validation.or(oom) {
            fields.destroy();
            log::error!("[fields] allocation failed: {err}");
            return Err(SimError::IncompleteFramebuffer {
                label: "fields".into(),
                width: grid.x,
                height: grid.y,
                reason: err.to_string(),
            });
        }
        log::info!(
            "[fields] grid {}x{}, dye {}x{} ({:?})",
            grid.x,
            grid.y,
            dye.x,
            dye.y,
            FIELD_FORMAT
        );
        Ok(fields)
    }

    pub fn grid_size(&self) -> UVec2 {
        self.velocity.read().size()
    }

    pub fn dye_size(&self) -> UVec2 {
        self.dye.read().size()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderTarget> {
        self.velocity
            .iter()
            .chain(self.dye.iter())
            .chain(std::iter::once(&self.divergence))
            .chain(self.pressure.iter())
    }

    /// Free every texture now instead of waiting for the last reference.
    pub fn destroy(&self) {
        for target in self.iter() {
            target.destroy();
        }
    }
}

fn check_size(label: &str, size: UVec2, max: u32) -> Result<(), SimError> {
    let reason = if size.x == 0 || size.y == 0 {
        "zero-sized attachment".to_owned()
    } else if size.x > max || size.y > max {
        format!("exceeds max texture dimension {max}")
    } else {
        return Ok(());
    };
    log::error!("[fields] `{label}` {}x{}: {reason}", size.x, size.y);
    Err(SimError::IncompleteFramebuffer {
        label: label.to_owned(),
        width: size.x,
        height: size.y,
        reason,
    })
}
