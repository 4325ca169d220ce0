mod camera;
mod pond;

use anyhow::{Context, Result};

use tidewater_engine::device::{Gpu, GpuInit};
use tidewater_engine::logging::{init_logging, LoggingConfig};
use tidewater_engine::render::{
    PassConstants, PassInputs, RendererConfig, SceneRenderer, TargetConfig, WgpuBackend,
};
use tidewater_engine::time::FrameClock;

use camera::OrbitCamera;

const DEFAULT_FRAMES: u64 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║            TIDEWATER STUDIO            ║");
    println!("  ║   wgpu · frame ring · live waves       ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a number, got {arg:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let gpu = Gpu::new_blocking(GpuInit::default()).context("failed to initialize GPU")?;
    let target = TargetConfig::default();
    let mut backend = WgpuBackend::new(&gpu, target);

    let config = RendererConfig::default();
    let mut scene = config.new_scene();
    let pond = pond::build(&mut scene, &mut backend)?;

    let mut renderer = SceneRenderer::new(config, backend, scene)
        .context("failed to create scene renderer")?;

    let mut camera = OrbitCamera::default();
    let aspect = target.width as f32 / target.height.max(1) as f32;
    let mut clock = FrameClock::fixed(FRAME_DT);

    let mut waits = 0u64;
    let mut disturbances = 0u64;
    for _ in 0..frames {
        let time = clock.tick();
        camera.orbit(time.dt, 0.05);

        renderer
            .scene_mut()
            .update_material(pond.water, |m| {
                let s = pond::WATER_SCROLL * time.dt;
                m.scroll(s.x, s.y)
            })
            .context("water material vanished")?;

        let pass = PassConstants::from_inputs(&PassInputs {
            view: camera.view(),
            proj: camera.proj(aspect),
            eye: camera.eye(),
            target_size: (target.width, target.height),
            near_z: camera.near_z,
            far_z: camera.far_z,
            total_time: time.total,
            delta_time: time.dt,
            ..PassInputs::default()
        });

        let stats = renderer
            .tick(time.dt, &pass)
            .with_context(|| format!("frame {} failed", time.frame_index))?;

        waits += stats.waited as u64;
        disturbances += stats.disturbance.is_some() as u64;
        if stats.frame_index % 60 == 0 {
            log::info!(
                "frame {:>5}  slot {}  fence {:>5}  objects {}  materials {}  waited {}",
                stats.frame_index,
                stats.slot,
                stats.fence_value,
                stats.objects_written,
                stats.materials_written,
                stats.waited,
            );
        }
    }

    renderer.flush().context("failed to flush GPU work")?;
    log::info!(
        "rendered {frames} frames: {waits} ring waits, {disturbances} wave disturbances, {} sim steps",
        renderer.waves().step_count()
    );
    Ok(())
}
