use anyhow::{Context, Result};

use crate::compile::{compile_pass_module, BlobPass, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::geometry::BlobGeometry;
use crate::types::Palette;

/// Straight alpha-over, accumulating coverage in the alpha channel.
const ALPHA_OVER: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

pub(crate) struct PipelineLayouts {
    /// Uniform buffer only; used by the background pass.
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Uniform buffer, offscreen texture and its sampler; used by the glass pass.
    pub backdrop_layout: wgpu::BindGroupLayout,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[uniform_entry],
        });

        let backdrop_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("backdrop layout"),
            entries: &[
                uniform_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            uniform_layout,
            backdrop_layout,
        }
    }
}

pub(crate) struct BlobPipelines {
    pub background: wgpu::RenderPipeline,
    pub glass: wgpu::RenderPipeline,
}

impl BlobPipelines {
    /// Both passes render into `format`: the offscreen target is created with
    /// the swapchain format.
    pub fn new(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        format: wgpu::TextureFormat,
        geometry: &BlobGeometry,
        palette: &Palette,
    ) -> Result<Self> {
        let background = create_pass_pipeline(
            device,
            BlobPass::Background,
            &layouts.uniform_layout,
            format,
            geometry,
            palette,
        )?;
        let glass = create_pass_pipeline(
            device,
            BlobPass::Glass,
            &layouts.backdrop_layout,
            format,
            geometry,
            palette,
        )?;
        Ok(Self { background, glass })
    }
}

fn create_pass_pipeline(
    device: &wgpu::Device,
    pass: BlobPass,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    geometry: &BlobGeometry,
    palette: &Palette,
) -> Result<wgpu::RenderPipeline> {
    let module = compile_pass_module(device, pass, geometry, palette)
        .with_context(|| format!("failed to build {}", pass.label()))?;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(pass.label()),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(pass.label()),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(ALPHA_OVER),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    }))
}
