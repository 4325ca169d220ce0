use std::mem::size_of;

use crate::render::{MaterialConstants, ObjectConstants, PassConstants, Vertex};
use crate::scene::RenderLayer;

use super::target::DEPTH_FORMAT;

// ── blend ─────────────────────────────────────────────────────────────────

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::Zero,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── bind group layout ─────────────────────────────────────────────────────

fn uniform_entry(binding: u32, dynamic: bool, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

/// Bindings shared by every layer: object (dynamic), material (dynamic), pass.
pub(super) fn scene_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tidewater scene bgl"),
        entries: &[
            uniform_entry(0, true, size_of::<ObjectConstants>()),
            uniform_entry(1, true, size_of::<MaterialConstants>()),
            uniform_entry(2, false, size_of::<PassConstants>()),
        ],
    })
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// One pipeline per render layer, all sharing the scene shader and bindings.
pub(super) struct ScenePipelines {
    opaque: wgpu::RenderPipeline,
    alpha_tested: wgpu::RenderPipeline,
    transparent: wgpu::RenderPipeline,
}

struct LayerState {
    label: &'static str,
    fs_entry: &'static str,
    blend: Option<wgpu::BlendState>,
}

impl ScenePipelines {
    pub(super) fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tidewater scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tidewater scene pipeline layout"),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        let build = |state: LayerState| {
            create_layer_pipeline(device, &layout, &shader, color_format, state)
        };

        Self {
            opaque: build(LayerState {
                label: "tidewater opaque pipeline",
                fs_entry: "fs_main",
                blend: None,
            }),
            alpha_tested: build(LayerState {
                label: "tidewater alpha-tested pipeline",
                fs_entry: "fs_alpha_tested",
                blend: None,
            }),
            transparent: build(LayerState {
                label: "tidewater transparent pipeline",
                fs_entry: "fs_main",
                blend: Some(alpha_blend()),
            }),
        }
    }

    pub(super) fn for_layer(&self, layer: RenderLayer) -> &wgpu::RenderPipeline {
        match layer {
            RenderLayer::Opaque => &self.opaque,
            RenderLayer::AlphaTested => &self.alpha_tested,
            RenderLayer::Transparent => &self.transparent,
        }
    }
}

fn create_layer_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    state: LayerState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(state.label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(state.fs_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: state.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Meshes come from several winding conventions; draw both faces.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}
