mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use glam::{Mat4, Vec3};

use common::{init_test_logging, SoftwareGpu};
use tidewater_engine::device::DeviceError;
use tidewater_engine::render::{PassConstants, RenderError, RendererConfig, SceneRenderer};
use tidewater_engine::scene::{Geometry, Material, MeshId, ObjectId, RenderLayer, Scene, SceneObject};
use tidewater_engine::sim::{StimulusConfig, WaveParams};
use tidewater_engine::sync::SlotCapacity;

fn config(ring_depth: usize) -> RendererConfig {
    RendererConfig {
        ring_depth,
        capacity: SlotCapacity { max_objects: 4, max_materials: 4, max_vertices: 64 },
        waves: WaveParams { rows: 8, cols: 8, ..WaveParams::default() },
        stimulus: StimulusConfig { seed: Some(9), ..StimulusConfig::default() },
    }
}

fn pond(cfg: &RendererConfig) -> (Scene, ObjectId) {
    let mut scene = cfg.new_scene();
    let grass = scene.add_material(Material::new("grass")).unwrap();
    let water = scene.add_material(Material::new("water")).unwrap();
    let hill = scene
        .add_object(SceneObject::new(Geometry::Static(MeshId(0)), grass, RenderLayer::Opaque))
        .unwrap();
    scene
        .add_object(SceneObject::new(Geometry::Waves, water, RenderLayer::Transparent))
        .unwrap();
    (scene, hill)
}

#[test]
fn changed_object_reaches_all_three_slots_then_stops() {
    init_test_logging();
    let cfg = config(3);
    let (scene, hill) = pond(&cfg);
    let mut r = SceneRenderer::new(cfg, SoftwareGpu::new(Duration::ZERO), scene).unwrap();
    let pass = PassConstants::default();

    // Initial upload of every object to every slot.
    for _ in 0..3 {
        r.tick(0.016, &pass).unwrap();
    }

    let world = Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0));
    r.scene_mut().update_object(hill, |o| o.world = world).unwrap();

    for _ in 0..3 {
        let stats = r.tick(0.016, &pass).unwrap();
        assert_eq!(stats.objects_written, 1);
    }
    assert_eq!(r.scene().object(hill).unwrap().counter().frames_dirty(), 0);
    for slot in r.ring().slots() {
        assert_eq!(slot.objects.read(hill.index()).unwrap().world, world.to_cols_array_2d());
    }

    let writes_before = r.ring().slots()[0].objects.write_count();
    let stats = r.tick(0.016, &pass).unwrap();
    assert_eq!(stats.slot, 0);
    assert_eq!(stats.objects_written, 0);
    assert_eq!(r.ring().slots()[0].objects.write_count(), writes_before);
}

#[test]
fn slow_gpu_bounds_cpu_lead_to_ring_depth() {
    init_test_logging();
    let cfg = config(3);
    let (scene, _) = pond(&cfg);
    let gpu = SoftwareGpu::new(Duration::from_millis(3));
    let log = gpu.log();
    let mut r = SceneRenderer::new(cfg, gpu, scene).unwrap();
    let pass = PassConstants::default();

    let mut waited = 0;
    for _ in 0..24 {
        let stats = r.tick(0.016, &pass).unwrap();
        waited += stats.waited as usize;
        assert!(r.ring().in_flight(r.fence()) <= 3);
        assert!(r.fence().current_target() - r.fence().completed_value() <= 3);
    }

    assert!(waited > 0, "a GPU slower than the CPU must make advance block");
    assert_eq!(log.reuse_violations.load(Ordering::SeqCst), 0);

    r.flush().unwrap();
    assert_eq!(r.fence().completed_value(), r.fence().current_target());
    assert_eq!(r.ring().in_flight(r.fence()), 0);
}

#[test]
fn single_slot_ring_serializes_every_frame() {
    init_test_logging();
    let cfg = config(1);
    let (scene, _) = pond(&cfg);
    let gpu = SoftwareGpu::new(Duration::from_millis(1));
    let log = gpu.log();
    let mut r = SceneRenderer::new(cfg, gpu, scene).unwrap();

    for i in 0..5 {
        let stats = r.tick(0.016, &PassConstants::default()).unwrap();
        assert_eq!(stats.slot, 0);
        assert_eq!(stats.fence_value, i + 1);
    }
    assert_eq!(log.reuse_violations.load(Ordering::SeqCst), 0);
}

#[test]
fn lost_device_aborts_the_tick_that_waits_on_it() {
    init_test_logging();
    let cfg = config(2);
    let (scene, _) = pond(&cfg);
    let gpu = SoftwareGpu::new(Duration::ZERO).losing_after(0);
    let mut r = SceneRenderer::new(cfg, gpu, scene).unwrap();
    let pass = PassConstants::default();

    let mut result = Ok(());
    for _ in 0..3 {
        if let Err(e) = r.tick(0.016, &pass) {
            result = Err(e);
            break;
        }
    }

    match result {
        Err(RenderError::Device(DeviceError::Lost(reason))) => {
            assert!(reason.contains("hung"));
        }
        other => panic!("expected a lost device, got {other:?}"),
    }
    assert!(matches!(r.flush(), Err(DeviceError::Lost(_))));
    // Dropping after loss must not hang or panic.
    drop(r);
}

#[test]
fn scrolling_material_is_rewritten_every_tick() {
    init_test_logging();
    let cfg = config(3);
    let (scene, _) = pond(&cfg);
    let water = scene.find_material("water").unwrap();
    let mut r = SceneRenderer::new(cfg, SoftwareGpu::new(Duration::ZERO), scene).unwrap();

    for _ in 0..6 {
        r.scene_mut()
            .update_material(water, |m| m.scroll(0.1 * 0.016, 0.02 * 0.016))
            .unwrap();
        let stats = r.tick(0.016, &PassConstants::default()).unwrap();
        assert!(stats.materials_written >= 1);
        assert_eq!(
            r.scene().material(water).unwrap().counter().frames_dirty(),
            2,
            "a change every tick keeps the counter at depth - 1 after propagation"
        );
    }
}
