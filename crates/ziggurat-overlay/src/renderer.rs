//! GPU bridge renderer.
//!
//! Owns the overlay's long-lived GPU state (pipelines, sampler, font atlas,
//! texture registry) and converts [`DrawData`] snapshots into deferred render
//! tasks on a [`DeviceContext`]. Nothing here touches the frame encoder
//! directly; all encoding happens when the frame owner drains the context's
//! post-render queue.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use ziggurat_engine::device::{DeviceContext, PostRenderCtx, TransientRange};

use crate::atlas::FontAtlas;
use crate::draw::{DrawCmd, DrawData, DrawIdx, DrawVert};
use crate::plan::{self, FrameLimits, PlanItem, Program};
use crate::texture::{TextureRef, TextureSlot};

/// Stride between dynamic-offset slots in an image LOD buffer. Matches the
/// default `min_uniform_buffer_offset_alignment`.
const LOD_SLOT_STRIDE: u64 = 256;

/// Tuning for [`OverlayRenderer::init`].
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Pixel size of the regular face; the mono face runs 3 points smaller.
    pub base_font_size: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            base_font_size: 18.0,
        }
    }
}

// ── GPU state ──────────────────────────────────────────────────────────────

struct Pipelines {
    ui_blend: wgpu::RenderPipeline,
    ui_opaque: wgpu::RenderPipeline,
    image_blend: wgpu::RenderPipeline,
    image_opaque: wgpu::RenderPipeline,
}

impl Pipelines {
    fn select(&self, program: Program, alpha_blend: bool) -> &wgpu::RenderPipeline {
        match (program, alpha_blend) {
            (Program::Ui, true) => &self.ui_blend,
            (Program::Ui, false) => &self.ui_opaque,
            (Program::Image, true) => &self.image_blend,
            (Program::Image, false) => &self.image_opaque,
        }
    }
}

/// Resources captured by every scheduled render task.
///
/// Field order doubles as drop order: bind group, projection buffer,
/// pipelines.
struct TaskShared {
    shared_bind_group: wgpu::BindGroup,
    projection_ubo: wgpu::Buffer,
    pipelines: Pipelines,
}

struct TextureBinding {
    bind_group: wgpu::BindGroup,
}

/// Per-task uniform buffer holding one `[lod, enabled, 0, 0]` value per
/// image draw, addressed with dynamic offsets.
struct LodChunk {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl LodChunk {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, slots: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ziggurat overlay image lod"),
            size: slots as u64 * LOD_SLOT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ziggurat overlay image lod"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(lod_min_binding_size()),
                }),
            }],
        });
        Self { buffer, bind_group }
    }
}

struct Resources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    atlas_texture: wgpu::Texture,
    shared: Arc<TaskShared>,
    texture_bgl: wgpu::BindGroupLayout,
    lod_bgl: wgpu::BindGroupLayout,
    registry: HashMap<u16, Arc<TextureBinding>>,
    next_slot: u16,
}

// ── renderer ───────────────────────────────────────────────────────────────

/// Draw-data bridge.
///
/// Lifecycle: [`init`](Self::init), any number of frames, then
/// [`shutdown`](Self::shutdown); the renderer may be re-initialized
/// afterwards. The bound [`DeviceContext`] can be swapped at any point in
/// that cycle; rendering with none bound drops the frame silently.
pub struct OverlayRenderer {
    context: Option<Arc<DeviceContext>>,
    resources: Option<Resources>,
    atlas: Option<Arc<FontAtlas>>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self {
            context: None,
            resources: None,
            atlas: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Glyph tables for producers laying out text. `None` before init.
    pub fn atlas(&self) -> Option<&Arc<FontAtlas>> {
        self.atlas.as_ref()
    }

    /// Binds or replaces the device context that receives render tasks.
    /// `None` unbinds.
    pub fn set_context(&mut self, context: Option<Arc<DeviceContext>>) {
        self.context = context;
    }

    /// Creates all GPU resources: the font atlas (baked and uploaded once),
    /// both shader programs with their blend variants, the shared vertex
    /// layout, the sampler, and the uniform buffers. The atlas registers as
    /// texture slot 0.
    pub fn init(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        config: &OverlayConfig,
    ) -> Result<()> {
        if self.resources.is_some() {
            bail!("overlay renderer is already initialized");
        }

        let atlas = FontAtlas::build(config.base_font_size).context("building font atlas")?;

        let ui_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ziggurat overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });
        let image_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ziggurat overlay image shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay_image.wgsl").into()),
        });

        let shared_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ziggurat overlay shared bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(projection_min_binding_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ziggurat overlay texture bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let lod_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ziggurat overlay lod bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(lod_min_binding_size()),
                },
                count: None,
            }],
        });

        let ui_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ziggurat overlay ui layout"),
            bind_group_layouts: &[&shared_bgl, &texture_bgl],
            immediate_size: 0,
        });
        let image_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ziggurat overlay image layout"),
            bind_group_layouts: &[&shared_bgl, &texture_bgl, &lod_bgl],
            immediate_size: 0,
        });

        let pipelines = Pipelines {
            ui_blend: build_pipeline(
                device,
                "ziggurat overlay ui blend",
                &ui_layout,
                &ui_shader,
                color_format,
                Some(alpha_blend()),
            ),
            ui_opaque: build_pipeline(
                device,
                "ziggurat overlay ui opaque",
                &ui_layout,
                &ui_shader,
                color_format,
                None,
            ),
            image_blend: build_pipeline(
                device,
                "ziggurat overlay image blend",
                &image_layout,
                &image_shader,
                color_format,
                Some(alpha_blend()),
            ),
            image_opaque: build_pipeline(
                device,
                "ziggurat overlay image opaque",
                &image_layout,
                &image_shader,
                color_format,
                None,
            ),
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ziggurat overlay sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let projection_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ziggurat overlay projection ubo"),
            size: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shared_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ziggurat overlay shared bind group"),
            layout: &shared_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: projection_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        // The atlas uploads exactly once; the texture never changes after.
        let atlas_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ziggurat overlay font atlas"),
            size: wgpu::Extent3d {
                width: atlas.width(),
                height: atlas.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            atlas.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas.width() * 4),
                rows_per_image: Some(atlas.height()),
            },
            wgpu::Extent3d {
                width: atlas.width(),
                height: atlas.height(),
                depth_or_array_layers: 1,
            },
        );
        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut resources = Resources {
            device: device.clone(),
            queue: queue.clone(),
            sampler,
            atlas_texture,
            shared: Arc::new(TaskShared {
                shared_bind_group,
                projection_ubo,
                pipelines,
            }),
            texture_bgl,
            lod_bgl,
            registry: HashMap::new(),
            next_slot: 0,
        };

        let atlas_slot = register_binding(&mut resources, &atlas_view);
        debug_assert_eq!(atlas_slot, TextureSlot::ATLAS);

        log::info!(
            "overlay renderer initialized: atlas {}x{}, target format {:?}",
            atlas.width(),
            atlas.height(),
            color_format
        );

        self.atlas = Some(Arc::new(atlas));
        self.resources = Some(resources);
        Ok(())
    }

    /// Per-frame begin hook. Present for lifecycle symmetry; the bridge
    /// keeps no per-frame state of its own yet.
    pub fn new_frame(&mut self) {}

    /// Registers an external texture view and returns its slot, to be packed
    /// into a [`TextureId`](crate::texture::TextureId) via
    /// [`TextureRef::pack`].
    pub fn register_texture(&mut self, view: &wgpu::TextureView) -> Result<TextureSlot> {
        let Some(res) = self.resources.as_mut() else {
            bail!("overlay renderer is not initialized");
        };
        if res.next_slot == u16::MAX {
            bail!("overlay texture registry is full");
        }
        Ok(register_binding(res, view))
    }

    /// Snapshots `data` and schedules one render task on the bound context.
    ///
    /// With no context bound the frame is dropped silently; before init it
    /// is dropped with a warning. All skip rules (minimized framebuffer,
    /// empty commands, offscreen clips, pool exhaustion) are applied when
    /// the task runs.
    pub fn render_draw_data(&self, data: &DrawData) {
        let Some(res) = self.resources.as_ref() else {
            log::warn!("overlay render_draw_data called before init; frame dropped");
            return;
        };
        let Some(context) = self.context.as_ref() else {
            return;
        };

        // Upper bound on image draws decides whether this task carries a LOD
        // chunk. Planning happens at run time, so over-provisioning by the
        // commands the plan later skips is expected.
        let image_cmds = count_image_commands(data);
        let lod = (image_cmds > 0)
            .then(|| Arc::new(LodChunk::new(&res.device, &res.lod_bgl, image_cmds)));

        let shared = Arc::clone(&res.shared);
        let textures = res.registry.clone();
        let data = data.clone();

        context.schedule_post_render(move |ctx| {
            encode_frame(ctx, &shared, &textures, lod.as_deref(), &data);
        });
    }

    /// Releases all GPU resources in order: sampler, atlas texture, uniform
    /// buffers, pipelines; clears the texture registry. Idempotent, safe
    /// after partial init, and leaves the renderer ready for a fresh
    /// [`init`](Self::init).
    pub fn shutdown(&mut self) {
        self.atlas = None;
        let Some(res) = self.resources.take() else {
            return;
        };

        let Resources {
            sampler,
            atlas_texture,
            shared,
            mut registry,
            ..
        } = res;
        drop(sampler);
        drop(atlas_texture);
        registry.clear();
        drop(shared);

        log::debug!("overlay renderer shut down");
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn register_binding(res: &mut Resources, view: &wgpu::TextureView) -> TextureSlot {
    let slot = res.next_slot;
    res.next_slot += 1;
    let bind_group = res.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ziggurat overlay texture bind group"),
        layout: &res.texture_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(view),
        }],
    });
    res.registry.insert(slot, Arc::new(TextureBinding { bind_group }));
    TextureSlot(slot)
}

/// Commands that would draw through the image program, before planning.
fn count_image_commands(data: &DrawData) -> usize {
    data.lists
        .iter()
        .flat_map(|list| list.commands.iter())
        .filter(|cmd| match cmd {
            DrawCmd::Elements { count, params } => {
                *count > 0 && TextureRef::unpack(params.texture).mip_level != 0
            }
            DrawCmd::Callback { .. } => false,
        })
        .count()
}

// ── encoding ───────────────────────────────────────────────────────────────

fn encode_frame(
    ctx: &mut PostRenderCtx<'_>,
    shared: &TaskShared,
    textures: &HashMap<u16, Arc<TextureBinding>>,
    lod: Option<&LodChunk>,
    data: &DrawData,
) {
    let (vertex_left, index_left) = ctx.transients.remaining();
    let Some(plan) = plan::plan_frame(
        data,
        FrameLimits {
            vertex_bytes: vertex_left,
            index_bytes: index_left,
        },
    ) else {
        return;
    };

    if plan.invalid_lists > 0 {
        log::warn!(
            "overlay: {} draw list(s) failed validation and were dropped",
            plan.invalid_lists
        );
    }
    if plan.dropped_lists > 0 {
        log::warn!(
            "overlay: transient pool exhausted; {} draw list(s) dropped this frame",
            plan.dropped_lists
        );
    }
    if plan.is_empty() {
        return;
    }

    // Claim pool space and upload each surviving list.
    let mut ranges: Vec<Option<(TransientRange, TransientRange)>> = vec![None; data.lists.len()];
    for upload in &plan.uploads {
        let list = &data.lists[upload.list];
        let Some((vr, ir)) = ctx.transients.alloc(upload.vertex_bytes, upload.index_bytes)
        else {
            log::warn!("overlay: transient claim failed for list {}", upload.list);
            break;
        };
        if !list.vertices.is_empty() {
            ctx.queue.write_buffer(
                ctx.transients.vertex_buffer(),
                vr.offset,
                bytemuck::cast_slice(&list.vertices),
            );
        }
        if !list.indices.is_empty() {
            write_indices(ctx.queue, ctx.transients.index_buffer(), ir.offset, &list.indices);
        }
        ranges[upload.list] = Some((vr, ir));
    }

    // One dynamic-offset slot per image draw, in item order.
    if let Some(lod) = lod {
        let mut slot = 0u64;
        for item in &plan.items {
            if let PlanItem::Draw(d) = item {
                if d.program == Program::Image {
                    let value = [d.lod, 1.0f32, 0.0, 0.0];
                    ctx.queue
                        .write_buffer(&lod.buffer, slot * LOD_SLOT_STRIDE, bytemuck::bytes_of(&value));
                    slot += 1;
                }
            }
        }
    }

    ctx.queue
        .write_buffer(&shared.projection_ubo, 0, bytemuck::bytes_of(&plan.projection));

    let mut rpass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ziggurat overlay pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: ctx.color_view,
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

    rpass.set_bind_group(0, &shared.shared_bind_group, &[]);

    let (target_w, target_h) = ctx.target_size;
    let mut image_slot = 0u32;
    for item in &plan.items {
        match item {
            PlanItem::Callback { list, cmd } => {
                let list = &data.lists[*list];
                if let DrawCmd::Callback { callback, params } = &list.commands[*cmd] {
                    callback(list, params);
                }
            }
            PlanItem::Draw(d) => {
                // Slot numbers must track the value writes above, so advance
                // before any skip below.
                let dyn_offset = (d.program == Program::Image).then(|| {
                    let offset = image_slot * LOD_SLOT_STRIDE as u32;
                    image_slot += 1;
                    offset
                });

                let Some((vr, ir)) = ranges[d.list] else {
                    continue;
                };
                let Some(binding) = textures.get(&d.slot.0) else {
                    log::warn!(
                        "overlay: draw references unknown texture slot {}; skipped",
                        d.slot.0
                    );
                    continue;
                };
                let Some(scissor) = d.scissor.clamped_to(target_w, target_h) else {
                    continue;
                };

                rpass.set_pipeline(shared.pipelines.select(d.program, d.alpha_blend));
                rpass.set_bind_group(1, &binding.bind_group, &[]);
                if let Some(offset) = dyn_offset {
                    let Some(lod) = lod else { continue };
                    rpass.set_bind_group(2, &lod.bind_group, &[offset]);
                }
                rpass.set_vertex_buffer(
                    0,
                    ctx.transients.vertex_buffer().slice(vr.offset..vr.end()),
                );
                rpass.set_index_buffer(
                    ctx.transients.index_buffer().slice(ir.offset..ir.end()),
                    wgpu::IndexFormat::Uint16,
                );
                rpass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
                rpass.draw_indexed(
                    d.first_index..d.first_index + d.index_count,
                    d.base_vertex,
                    0..1,
                );
            }
        }
    }
}

/// Uploads u16 indices, padding odd counts so the write size stays on copy
/// alignment. The claimed range is always large enough for the pad.
fn write_indices(queue: &wgpu::Queue, buffer: &wgpu::Buffer, offset: u64, indices: &[DrawIdx]) {
    if indices.len() % 2 == 0 {
        queue.write_buffer(buffer, offset, bytemuck::cast_slice(indices));
    } else {
        let mut padded = Vec::with_capacity(indices.len() + 1);
        padded.extend_from_slice(indices);
        padded.push(0);
        queue.write_buffer(buffer, offset, bytemuck::cast_slice(&padded));
    }
}

// ── GPU helpers ────────────────────────────────────────────────────────────

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
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
    }
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2, // pos
    1 => Float32x2, // uv
    2 => Unorm8x4   // color
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: DrawVert::STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
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
    })
}

/// Minimum binding size of the projection uniform. A `mat4x4<f32>` is 64
/// bytes, so the size is non-zero by construction.
fn projection_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<[[f32; 4]; 4]>() as u64)
        .expect("projection uniform has non-zero size by construction")
}

/// Minimum binding size of one image LOD slot (`vec4<f32>`).
fn lod_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(16).expect("image LOD uniform has non-zero size by construction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawCmdParams;
    use crate::texture::TextureId;

    fn data_with_textures(ids: &[TextureId]) -> DrawData {
        let commands = ids
            .iter()
            .map(|id| DrawCmd::Elements {
                count: 3,
                params: DrawCmdParams {
                    clip_rect: [0.0, 0.0, 100.0, 100.0],
                    texture: *id,
                    ..DrawCmdParams::default()
                },
            })
            .collect();
        DrawData {
            display_pos: [0.0, 0.0],
            display_size: [100.0, 100.0],
            framebuffer_scale: [1.0, 1.0],
            lists: vec![crate::draw::DrawList {
                vertices: vec![DrawVert::default(); 3],
                indices: vec![0, 1, 2],
                commands,
            }],
        }
    }

    #[test]
    fn fresh_renderer_is_uninitialized() {
        let r = OverlayRenderer::new();
        assert!(!r.is_initialized());
        assert!(r.atlas().is_none());
    }

    #[test]
    fn render_before_init_is_a_no_op() {
        let r = OverlayRenderer::new();
        r.render_draw_data(&data_with_textures(&[TextureId::NONE]));
    }

    #[test]
    fn shutdown_is_idempotent_before_init() {
        let mut r = OverlayRenderer::new();
        r.shutdown();
        r.shutdown();
        assert!(!r.is_initialized());
    }

    #[test]
    fn set_context_accepts_none() {
        let mut r = OverlayRenderer::new();
        r.set_context(None);
        r.new_frame();
    }

    #[test]
    fn image_command_census_ignores_ui_and_empty_draws() {
        let image = TextureRef {
            slot: TextureSlot(1),
            alpha_blend: false,
            mip_level: 2,
        }
        .pack();
        let mut data = data_with_textures(&[TextureId::NONE, image, image]);
        assert_eq!(count_image_commands(&data), 2);

        // Zero-element image commands never reach the image program.
        data.lists[0].commands.push(DrawCmd::Elements {
            count: 0,
            params: DrawCmdParams {
                texture: image,
                ..DrawCmdParams::default()
            },
        });
        assert_eq!(count_image_commands(&data), 2);
    }
}
