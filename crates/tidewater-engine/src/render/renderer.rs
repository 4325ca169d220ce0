use glam::Vec2;

use crate::device::DeviceError;
use crate::scene::Scene;
use crate::sim::{grid_indices, Disturbance, HeightField, Stimulus, StimulusConfig, WaveParams};
use crate::sync::{
    FenceSignal, FrameResourceRing, RingError, SlotCapacity, SyncFence, DEFAULT_RING_DEPTH,
};

use super::{FrameBackend, PassConstants, RenderError, Vertex};

/// Construction parameters for a [`SceneRenderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub ring_depth: usize,
    pub capacity: SlotCapacity,
    pub waves: WaveParams,
    pub stimulus: StimulusConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let waves = WaveParams::default();
        Self {
            ring_depth: DEFAULT_RING_DEPTH,
            capacity: SlotCapacity {
                max_objects: 64,
                max_materials: 16,
                max_vertices: waves.rows * waves.cols,
            },
            waves,
            stimulus: StimulusConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Empty scene sized for this configuration.
    pub fn new_scene(&self) -> Scene {
        Scene::new(self.ring_depth, self.capacity)
    }
}

/// What one [`SceneRenderer::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    /// Ring slot written this tick.
    pub slot: usize,
    /// Fence value the GPU signals when this tick's work completes.
    pub fence_value: u64,
    /// Whether acquiring the slot had to block on the GPU.
    pub waited: bool,
    pub objects_written: usize,
    pub materials_written: usize,
    pub disturbance: Option<Disturbance>,
    pub sim_stepped: bool,
}

/// Drives one frame per tick: simulate, fill the next ring slot, submit.
///
/// The CPU runs at most `ring_depth - 1` frames ahead of the GPU; the only
/// place it ever waits is when a slot is reacquired.
pub struct SceneRenderer<B: FrameBackend> {
    backend: B,
    fence: SyncFence,
    signal: FenceSignal,
    ring: FrameResourceRing,
    waves: HeightField,
    stimulus: Stimulus,
    scene: Scene,
    wave_vertices: Vec<Vertex>,
    frame_index: u64,
}

impl<B: FrameBackend> SceneRenderer<B> {
    pub fn new(config: RendererConfig, mut backend: B, scene: Scene) -> Result<Self, RenderError> {
        let RendererConfig { ring_depth, capacity, waves, stimulus } = config;

        let ring = FrameResourceRing::new(ring_depth, capacity)?;
        let waves = HeightField::new(waves)?;

        if waves.vertex_count() > capacity.max_vertices {
            return Err(RingError::InvalidCapacity("wave grid does not fit in max_vertices").into());
        }
        if scene.ring_depth() != ring_depth {
            return Err(RenderError::Config(format!(
                "scene tracks {} slots but the ring has {ring_depth}",
                scene.ring_depth()
            )));
        }
        // The scene can still grow after construction, so its limits must fit
        // the slots, not just its current contents.
        let limits = scene.capacity();
        if limits.max_objects > capacity.max_objects
            || limits.max_materials > capacity.max_materials
        {
            return Err(RenderError::Config(format!(
                "scene admits {} objects / {} materials, slots fit {} / {}",
                limits.max_objects,
                limits.max_materials,
                capacity.max_objects,
                capacity.max_materials,
            )));
        }

        let mut fence = SyncFence::new();
        backend.bind_fence(&mut fence);
        backend.upload_wave_indices(&grid_indices(waves.rows(), waves.cols()))?;

        log::info!(
            "scene renderer ready: {} objects, {} materials, {}x{} wave grid",
            scene.object_count(),
            scene.material_count(),
            waves.rows(),
            waves.cols(),
        );

        Ok(Self {
            backend,
            signal: fence.signal_handle(),
            fence,
            ring,
            wave_vertices: Vec::with_capacity(waves.vertex_count()),
            waves,
            stimulus: Stimulus::new(stimulus),
            scene,
            frame_index: 0,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    pub fn waves(&self) -> &HeightField {
        &self.waves
    }

    #[inline]
    pub fn waves_mut(&mut self) -> &mut HeightField {
        &mut self.waves
    }

    #[inline]
    pub fn fence(&self) -> &SyncFence {
        &self.fence
    }

    #[inline]
    pub fn ring(&self) -> &FrameResourceRing {
        &self.ring
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of ticks submitted so far.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // ── per-frame ─────────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32, pass: &PassConstants) -> Result<FrameStats, RenderError> {
        let disturbance = self.stimulus.step(dt, &mut self.waves);
        let sim_stepped = self.waves.update(dt);

        let waits = self.ring.wait_count();
        let slot = self.ring.advance(&self.fence)?;
        let slot_index = slot.index();

        let written = self.scene.propagate(slot)?;
        slot.pass.write(0, pass)?;

        fill_wave_vertices(&self.waves, &mut self.wave_vertices);
        slot.vertices.write_slice(0, &self.wave_vertices)?;

        let fence_value = self.fence.next_target();
        self.backend
            .submit_frame(slot, self.scene.draw_list(), &self.signal, fence_value)?;

        let committed = self.fence.advance_target();
        self.ring.mark_submitted(committed);

        let stats = FrameStats {
            frame_index: self.frame_index,
            slot: slot_index,
            fence_value: committed,
            waited: self.ring.wait_count() > waits,
            objects_written: written.objects,
            materials_written: written.materials,
            disturbance,
            sim_stepped,
        };
        self.frame_index += 1;

        log::trace!("{stats:?}");
        Ok(stats)
    }

    /// Blocks until the GPU has finished everything submitted so far.
    pub fn flush(&self) -> Result<(), DeviceError> {
        self.fence.flush()
    }
}

impl<B: FrameBackend> Drop for SceneRenderer<B> {
    fn drop(&mut self) {
        match self.ring.wait_idle(&self.fence) {
            Ok(()) => log::info!(
                "scene renderer shut down after {} frames (fence {})",
                self.frame_index,
                self.fence.completed_value()
            ),
            Err(e) => log::error!("GPU work still pending at shutdown: {e}"),
        }
    }
}

/// Wave surface as render vertices, row-major. Texture coordinates stretch
/// the unit square over the grid.
pub fn fill_wave_vertices(waves: &HeightField, out: &mut Vec<Vertex>) {
    let (w, d) = (waves.width(), waves.depth());
    out.clear();
    out.extend((0..waves.vertex_count()).map(|i| {
        let p = waves.position(i);
        Vertex::new(p, waves.normal(i), Vec2::new(0.5 + p.x / w, 0.5 - p.z / d))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DrawList, Geometry, Material, RenderLayer, SceneError, SceneObject};
    use crate::sync::FrameResourceSlot;
    use std::sync::{Arc, Mutex};

    /// Completes every submission immediately.
    #[derive(Default)]
    struct InstantBackend {
        submitted: Vec<u64>,
        wave_indices: usize,
        fail_next: bool,
    }

    impl FrameBackend for InstantBackend {
        fn upload_wave_indices(&mut self, indices: &[u32]) -> Result<(), DeviceError> {
            self.wave_indices = indices.len();
            Ok(())
        }

        fn submit_frame(
            &mut self,
            slot: &mut FrameResourceSlot,
            _draws: &DrawList,
            signal: &FenceSignal,
            fence_value: u64,
        ) -> Result<(), DeviceError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(DeviceError::SubmissionRejected("test".into()));
            }
            slot.objects.take_dirty();
            self.submitted.push(fence_value);
            signal.signal(fence_value);
            Ok(())
        }
    }

    fn config() -> RendererConfig {
        RendererConfig {
            waves: WaveParams { rows: 8, cols: 8, ..WaveParams::default() },
            capacity: SlotCapacity { max_objects: 4, max_materials: 2, max_vertices: 64 },
            stimulus: StimulusConfig { seed: Some(1), ..StimulusConfig::default() },
            ..RendererConfig::default()
        }
    }

    fn water_scene(cfg: &RendererConfig) -> Scene {
        let mut scene = cfg.new_scene();
        let water = scene.add_material(Material::new("water")).unwrap();
        scene
            .add_object(SceneObject::new(Geometry::Waves, water, RenderLayer::Transparent))
            .unwrap();
        scene
    }

    #[test]
    fn uploads_wave_indices_on_construction() {
        let cfg = config();
        let scene = water_scene(&cfg);
        let r = SceneRenderer::new(cfg, InstantBackend::default(), scene).unwrap();
        assert_eq!(r.backend().wave_indices, 6 * 7 * 7);
    }

    #[test]
    fn ticks_advance_fence_and_slots() {
        let cfg = config();
        let scene = water_scene(&cfg);
        let mut r = SceneRenderer::new(cfg, InstantBackend::default(), scene).unwrap();
        let pass = PassConstants::default();

        let stats: Vec<FrameStats> = (0..4).map(|_| r.tick(0.016, &pass).unwrap()).collect();
        let slots: Vec<usize> = stats.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 0]);
        assert_eq!(r.backend().submitted, vec![1, 2, 3, 4]);
        assert_eq!(r.fence().current_target(), 4);
        assert_eq!(stats[0].objects_written, 1);
        assert_eq!(stats[3].objects_written, 0);
        assert!(stats.iter().all(|s| !s.waited));
    }

    #[test]
    fn failed_submit_does_not_consume_fence_value() {
        let cfg = config();
        let scene = water_scene(&cfg);
        let mut r = SceneRenderer::new(cfg, InstantBackend::default(), scene).unwrap();
        let pass = PassConstants::default();

        r.backend_mut().fail_next = true;
        let err = r.tick(0.016, &pass).unwrap_err();
        assert!(matches!(err, RenderError::Device(DeviceError::SubmissionRejected(_))));
        assert_eq!(r.fence().current_target(), 0);

        let stats = r.tick(0.016, &pass).unwrap();
        assert_eq!(stats.fence_value, 1);
    }

    #[test]
    fn wave_vertices_are_streamed_every_tick() {
        let cfg = config();
        let scene = water_scene(&cfg);
        let mut r = SceneRenderer::new(cfg, InstantBackend::default(), scene).unwrap();
        r.waves_mut().disturb(4, 4, 1.0).unwrap();
        r.tick(0.03, &PassConstants::default()).unwrap();

        let slot = r.ring().active_slot();
        let i = r.waves().index(4, 4);
        let v = slot.vertices.read(i).unwrap();
        assert_eq!(v.position[1], r.waves().height(4, 4));
        assert!(v.position[1] > 0.0);
    }

    #[test]
    fn rejects_mismatched_scene() {
        let cfg = config();
        let scene = Scene::new(2, cfg.capacity);
        let err = SceneRenderer::new(cfg, InstantBackend::default(), scene).err().unwrap();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn rejects_scene_that_could_outgrow_the_slots() {
        let cfg = config();
        let roomy = SlotCapacity { max_objects: 8, ..cfg.capacity };
        let scene = Scene::new(cfg.ring_depth, roomy);
        let err = SceneRenderer::new(cfg, InstantBackend::default(), scene).err().unwrap();
        assert!(matches!(err, RenderError::Config(_)));

        let cfg = config();
        let roomy = SlotCapacity { max_materials: 8, ..cfg.capacity };
        let scene = Scene::new(cfg.ring_depth, roomy);
        let err = SceneRenderer::new(cfg, InstantBackend::default(), scene).err().unwrap();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn object_overflow_is_rejected_at_registration() {
        let cfg = config();
        let max_objects = cfg.capacity.max_objects;
        let scene = water_scene(&cfg);
        let mut r = SceneRenderer::new(cfg, InstantBackend::default(), scene).unwrap();
        let water = r.scene().find_material("water").unwrap();

        for _ in 1..max_objects {
            r.scene_mut()
                .add_object(SceneObject::new(Geometry::Waves, water, RenderLayer::Opaque))
                .unwrap();
        }
        let overflow = r
            .scene_mut()
            .add_object(SceneObject::new(Geometry::Waves, water, RenderLayer::Opaque));
        assert!(matches!(overflow, Err(SceneError::CapacityExceeded { .. })));

        let stats = r.tick(0.016, &PassConstants::default()).unwrap();
        assert_eq!(stats.objects_written, max_objects);
    }

    #[test]
    fn rejects_wave_grid_larger_than_vertex_region() {
        let mut cfg = config();
        cfg.capacity.max_vertices = 10;
        let scene = cfg.new_scene();
        let err = SceneRenderer::new(cfg, InstantBackend::default(), scene).err().unwrap();
        assert!(matches!(err, RenderError::Ring(RingError::InvalidCapacity(_))));
    }

    #[test]
    fn texture_coordinates_span_the_grid() {
        let waves = HeightField::new(WaveParams { rows: 4, cols: 4, ..WaveParams::default() }).unwrap();
        let mut out = Vec::new();
        fill_wave_vertices(&waves, &mut out);
        assert_eq!(out.len(), 16);
        // x = -1.5, width 4 -> u = 0.125
        assert_eq!(out[0].tex_coord, [0.125, 0.125]);
        assert_eq!(out[15].tex_coord, [0.875, 0.875]);
    }

    #[test]
    fn drop_waits_for_outstanding_work() {
        struct Deferred(Arc<Mutex<Vec<(FenceSignal, u64)>>>);

        impl FrameBackend for Deferred {
            fn submit_frame(
                &mut self,
                _slot: &mut FrameResourceSlot,
                _draws: &DrawList,
                signal: &FenceSignal,
                fence_value: u64,
            ) -> Result<(), DeviceError> {
                self.0.lock().unwrap().push((signal.clone(), fence_value));
                Ok(())
            }
        }

        let pending = Arc::new(Mutex::new(Vec::new()));
        let cfg = config();
        let scene = water_scene(&cfg);
        let mut r = SceneRenderer::new(cfg, Deferred(Arc::clone(&pending)), scene).unwrap();
        r.tick(0.016, &PassConstants::default()).unwrap();
        r.tick(0.016, &PassConstants::default()).unwrap();

        let gpu = {
            let pending = Arc::clone(&pending);
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                for (signal, value) in pending.lock().unwrap().drain(..) {
                    signal.signal(value);
                }
            })
        };

        let fence = r.fence().signal_handle();
        drop(r);
        assert!(fence.lost().is_none());
        gpu.join().unwrap();
        assert!(pending.lock().unwrap().is_empty());
    }
}
