use std::sync::Arc;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::device::{DeviceError, Gpu};
use crate::render::{FrameBackend, MaterialConstants, ObjectConstants, PassConstants, Vertex};
use crate::scene::{DrawList, Geometry, MeshId, RenderLayer};
use crate::sync::{FenceSignal, FrameResourceSlot, SyncFence, UploadBuffer};

use super::fence_driver::WgpuFenceDriver;
use super::pipeline::{scene_bind_group_layout, ScenePipelines};
use super::target::{OffscreenTarget, TargetConfig};

/// GPU copies of one ring slot's upload regions.
struct SlotGpu {
    objects: wgpu::Buffer,
    materials: wgpu::Buffer,
    pass: wgpu::Buffer,
    vertices: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct MeshGpu {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

/// [`FrameBackend`] on top of wgpu, rendering into an offscreen target.
///
/// Each ring slot gets its own uniform and vertex buffers, created the first
/// time the slot is submitted. Only the byte ranges the CPU wrote since the
/// slot's previous submission are copied to the GPU.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    driver: Arc<WgpuFenceDriver>,

    target: OffscreenTarget,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: ScenePipelines,

    slots: Vec<Option<SlotGpu>>,
    meshes: Vec<MeshGpu>,
    wave_indices: Option<(wgpu::Buffer, u32)>,
}

impl WgpuBackend {
    pub fn new(gpu: &Gpu, target: TargetConfig) -> Self {
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let bind_group_layout = scene_bind_group_layout(&device);
        let pipelines = ScenePipelines::new(&device, &bind_group_layout, target.color_format);
        let target = OffscreenTarget::new(&device, target);

        Self {
            driver: WgpuFenceDriver::new(device.clone()),
            device,
            queue,
            target,
            bind_group_layout,
            pipelines,
            slots: Vec::new(),
            meshes: Vec::new(),
            wave_indices: None,
        }
    }

    #[inline]
    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Uploads an immutable indexed mesh and returns its handle.
    pub fn upload_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32]) -> MeshId {
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(MeshGpu {
            vertices: vbo,
            indices: ibo,
            index_count: indices.len() as u32,
        });
        log::debug!("uploaded mesh {label:?} as {id:?} ({} indices)", indices.len());
        id
    }

    fn ensure_slot(&mut self, slot: &FrameResourceSlot) {
        let i = slot.index();
        if self.slots.len() <= i {
            self.slots.resize_with(i + 1, || None);
        }
        if self.slots[i].is_some() {
            return;
        }

        let buffer = |name: &str, size: usize, usage: wgpu::BufferUsages| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("tidewater slot {i} {name}")),
                // Zero-sized buffers cannot be bound.
                size: size.max(wgpu::COPY_BUFFER_ALIGNMENT as usize).next_multiple_of(4) as u64,
                usage: usage | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let uniform = wgpu::BufferUsages::UNIFORM;
        let objects = buffer("objects", slot.objects.byte_len().max(slot.objects.stride()), uniform);
        let materials =
            buffer("materials", slot.materials.byte_len().max(slot.materials.stride()), uniform);
        let pass = buffer("pass", slot.pass.byte_len(), uniform);
        let vertices = buffer("vertices", slot.vertices.byte_len(), wgpu::BufferUsages::VERTEX);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("tidewater slot {i} bind group")),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: block_binding(&objects, std::mem::size_of::<ObjectConstants>()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: block_binding(&materials, std::mem::size_of::<MaterialConstants>()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: block_binding(&pass, std::mem::size_of::<PassConstants>()),
                },
            ],
        });

        log::debug!("created GPU buffers for frame slot {i}");
        self.slots[i] = Some(SlotGpu {
            objects,
            materials,
            pass,
            vertices,
            bind_group,
        });
    }

    /// Rejects draws that reference geometry this backend does not hold.
    fn check_draws(&self, draws: &DrawList) -> Result<(), DeviceError> {
        for item in draws.items() {
            match item.geometry {
                Geometry::Static(id) if id.0 as usize >= self.meshes.len() => {
                    return Err(DeviceError::SubmissionRejected(format!(
                        "{:?} draws unknown mesh {id:?}",
                        item.object
                    )));
                }
                Geometry::Waves if self.wave_indices.is_none() => {
                    return Err(DeviceError::SubmissionRejected(
                        "wave geometry drawn before its indices were uploaded".into(),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Binds one constant block; dynamic offsets select the element.
fn block_binding(buffer: &wgpu::Buffer, size: usize) -> wgpu::BindingResource<'_> {
    wgpu::BindingResource::Buffer(wgpu::BufferBinding {
        buffer,
        offset: 0,
        size: wgpu::BufferSize::new(size as u64),
    })
}

fn upload_region<T: Pod>(queue: &wgpu::Queue, buffer: &wgpu::Buffer, region: &mut UploadBuffer<T>) {
    if let Some(range) = region.take_dirty() {
        queue.write_buffer(buffer, range.start as u64, &region.as_bytes()[range]);
    }
}

impl FrameBackend for WgpuBackend {
    fn bind_fence(&mut self, fence: &mut SyncFence) {
        fence.set_driver(self.driver.clone());

        let signal = fence.signal_handle();
        self.device.set_device_lost_callback(move |reason, message| {
            signal.device_lost(format!("{reason:?}: {message}"));
        });
    }

    fn upload_wave_indices(&mut self, indices: &[u32]) -> Result<(), DeviceError> {
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tidewater wave indices"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.wave_indices = Some((ibo, indices.len() as u32));
        Ok(())
    }

    fn submit_frame(
        &mut self,
        slot: &mut FrameResourceSlot,
        draws: &DrawList,
        signal: &FenceSignal,
        fence_value: u64,
    ) -> Result<(), DeviceError> {
        if let Some(reason) = signal.lost() {
            return Err(DeviceError::Lost(reason));
        }
        self.check_draws(draws)?;
        self.ensure_slot(slot);

        let Some(gpu) = self.slots[slot.index()].as_ref() else {
            return Err(DeviceError::SubmissionRejected(format!(
                "no GPU buffers for slot {}",
                slot.index()
            )));
        };

        // The frame clears to the fog color so distant geometry fades into it.
        let clear = slot.pass.read(0).map_or(wgpu::Color::BLACK, |p| {
            let [r, g, b, a] = p.fog_color.map(f64::from);
            wgpu::Color { r, g, b, a }
        });

        upload_region(&self.queue, &gpu.objects, &mut slot.objects);
        upload_region(&self.queue, &gpu.materials, &mut slot.materials);
        upload_region(&self.queue, &gpu.pass, &mut slot.pass);
        upload_region(&self.queue, &gpu.vertices, &mut slot.vertices);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tidewater frame encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tidewater scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for layer in RenderLayer::ALL {
                let items = draws.layer(layer);
                if items.is_empty() {
                    continue;
                }
                rpass.set_pipeline(self.pipelines.for_layer(layer));

                for item in items {
                    let offsets = [
                        slot.objects.offset_of(item.object.index()) as u32,
                        slot.materials.offset_of(item.material.index()) as u32,
                    ];
                    rpass.set_bind_group(0, &gpu.bind_group, &offsets);

                    let (vertices, indices, count) = match item.geometry {
                        Geometry::Static(id) => {
                            let Some(mesh) = self.meshes.get(id.0 as usize) else { continue };
                            (&mesh.vertices, &mesh.indices, mesh.index_count)
                        }
                        Geometry::Waves => {
                            let Some((ibo, count)) = self.wave_indices.as_ref() else { continue };
                            (&gpu.vertices, ibo, *count)
                        }
                    };
                    rpass.set_vertex_buffer(0, vertices.slice(..));
                    rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..count, 0, 0..1);
                }
            }
        }

        let index = self.queue.submit(std::iter::once(encoder.finish()));
        self.driver.record(fence_value, index, signal.completed());

        // Registered after the submit so it covers this frame's commands.
        let signal = signal.clone();
        self.queue
            .on_submitted_work_done(move || signal.signal(fence_value));

        Ok(())
    }
}
