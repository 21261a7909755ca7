use bytemuck::{Pod, Zeroable};

use crate::model::{position_layout, ModelId, ModelLoader, RawModel};
use crate::paint::Color;

use super::{RenderCtx, RenderTarget};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TintUniform {
    color: [f32; 4],
}

/// Draws [`RawModel`]s as flat-colored triangle lists.
///
/// Positions are taken as clip-space coordinates. The pipeline is built on
/// first use and rebuilt if the surface format changes.
#[derive(Default)]
pub struct ModelRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    tint_ubo: Option<wgpu::Buffer>,

    warned_missing: Option<ModelId>,
}

impl ModelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `model` with `tint` on top of the target's current contents.
    ///
    /// A model whose buffer is no longer live in `loader` is skipped. The tint
    /// uniform is written through the queue, so every draw of one frame uses
    /// the last tint passed in that frame.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        loader: &ModelLoader,
        model: &RawModel,
        tint: Color,
    ) {
        let Some(vbo) = loader.buffer(model.id()) else {
            if self.warned_missing != Some(model.id()) {
                log::warn!("model {} has no live vertex buffer; skipped", model.id());
                self.warned_missing = Some(model.id());
            }
            return;
        };

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);
        self.write_tint(ctx, tint);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("arsia model pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..model.vertex_count(), 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("arsia model shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("arsia model bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<TintUniform>() as u64,
                            ),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("arsia model pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("arsia model pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[position_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

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
            multiview_mask: None,
            cache: None,
        });

        log::debug!("model pipeline built for {:?}", ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        // Bindings belong to the old layout.
        self.bind_group = None;
        self.tint_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.tint_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let tint_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("arsia model tint ubo"),
            size: std::mem::size_of::<TintUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("arsia model bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: tint_ubo.as_entire_binding(),
            }],
        });

        self.tint_ubo = Some(tint_ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_tint(&self, ctx: &RenderCtx<'_>, tint: Color) {
        let Some(ubo) = self.tint_ubo.as_ref() else { return };
        let u = TintUniform {
            color: tint.clamped().to_array(),
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }
}
