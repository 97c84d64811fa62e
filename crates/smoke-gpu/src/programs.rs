use crate::helpers;
use smoke_core::{ShaderStage, SimError};

// Shaders bundled as string constants
pub static FULLSCREEN_WGSL: &str = include_str!("../shaders/fullscreen.wgsl");
pub static ADVECTION_WGSL: &str = include_str!("../shaders/advection.wgsl");
pub static DIVERGENCE_WGSL: &str = include_str!("../shaders/divergence.wgsl");
pub static PRESSURE_WGSL: &str = include_str!("../shaders/pressure.wgsl");
pub static GRADIENT_WGSL: &str = include_str!("../shaders/gradient.wgsl");
pub static SPLAT_WGSL: &str = include_str!("../shaders/splat.wgsl");
pub static DISPLAY_WGSL: &str = include_str!("../shaders/display.wgsl");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Advection,
    Divergence,
    Pressure,
    Gradient,
    Splat,
    Display,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 6] = [
        ProgramKind::Advection,
        ProgramKind::Divergence,
        ProgramKind::Pressure,
        ProgramKind::Gradient,
        ProgramKind::Splat,
        ProgramKind::Display,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Advection => "advection",
            ProgramKind::Divergence => "divergence",
            ProgramKind::Pressure => "pressure",
            ProgramKind::Gradient => "gradient",
            ProgramKind::Splat => "splat",
            ProgramKind::Display => "display",
        }
    }

    pub fn fragment_source(self) -> &'static str {
        match self {
            ProgramKind::Advection => ADVECTION_WGSL,
            ProgramKind::Divergence => DIVERGENCE_WGSL,
            ProgramKind::Pressure => PRESSURE_WGSL,
            ProgramKind::Gradient => GRADIENT_WGSL,
            ProgramKind::Splat => SPLAT_WGSL,
            ProgramKind::Display => DISPLAY_WGSL,
        }
    }

    /// Display draws to the visible surface; everything else renders fields.
    fn targets_screen(self) -> bool {
        self == ProgramKind::Display
    }
}

/// The six compiled fluid programs plus the bind group layout they share.
///
/// Binding 0 is a uniform block, 1 the field sampler, 2 and 3 source
/// textures. Programs ignore the bindings they do not declare.
pub struct ProgramLibrary {
    layout: wgpu::BindGroupLayout,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl ProgramLibrary {
    /// Compile every program. Any compile or link failure aborts with no
    /// partial library.
    pub async fn compile(
        device: &wgpu::Device,
        field_format: wgpu::TextureFormat,
        present_format: wgpu::TextureFormat,
    ) -> Result<Self, SimError> {
        let layout = create_field_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_fluid"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let vertex =
            compile_module(device, "fullscreen", ShaderStage::Vertex, FULLSCREEN_WGSL).await?;

        let mut pipelines = Vec::with_capacity(ProgramKind::ALL.len());
        for kind in ProgramKind::ALL {
            let fragment = compile_module(
                device,
                kind.name(),
                ShaderStage::Fragment,
                kind.fragment_source(),
            )
            .await?;
            let (entry, format, blend) = if kind.targets_screen() {
                (
                    "vs_screen",
                    present_format,
                    Some(wgpu::BlendState::ALPHA_BLENDING),
                )
            } else {
                ("vs_field", field_format, None)
            };
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = helpers::make_fullscreen_pipeline(
                device,
                kind.name(),
                &pipeline_layout,
                &vertex,
                entry,
                &fragment,
                format,
                blend,
            );
            if let Some(err) = device.pop_error_scope().await {
                log::error!("[programs] {} failed to link: {err}", kind.name());
                return Err(SimError::ProgramLink {
                    program: kind.name(),
                    log: err.to_string(),
                });
            }
            pipelines.push(pipeline);
        }
        log::info!("[programs] compiled {} programs", ProgramKind::ALL.len());
        Ok(Self { layout, pipelines })
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn pipeline(&self, kind: ProgramKind) -> &wgpu::RenderPipeline {
        &self.pipelines[kind as usize]
    }
}

fn create_field_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("fluid_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            texture(2),
            texture(3),
        ],
    })
}

/// Create a shader module and collect its compiler diagnostics.
async fn compile_module(
    device: &wgpu::Device,
    program: &'static str,
    stage: ShaderStage,
    source: &'static str,
) -> Result<wgpu::ShaderModule, SimError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let info = module.get_compilation_info().await;
    let scope = device.pop_error_scope().await;

    let mut messages: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect();
    if let Some(err) = scope {
        messages.push(err.to_string());
    }
    if messages.is_empty() {
        return Ok(module);
    }
    let log = messages.join("\n");
    log::error!("[programs] {program} ({stage}) failed to compile:\n{log}");
    Err(SimError::ShaderCompile {
        program,
        stage,
        log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_a_fragment_entry() {
        for kind in ProgramKind::ALL {
            assert!(
                kind.fragment_source().contains("fn fs_main"),
                "{} lacks fs_main",
                kind.name()
            );
        }
        assert!(FULLSCREEN_WGSL.contains("fn vs_field"));
        assert!(FULLSCREEN_WGSL.contains("fn vs_screen"));
    }

    #[test]
    fn kinds_index_their_own_slot() {
        for (i, kind) in ProgramKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }
}
