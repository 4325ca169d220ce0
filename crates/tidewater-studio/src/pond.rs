//! The demo scene: hills, a pond, a wire crate and a small brick fort.

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};

use tidewater_engine::render::{Vertex, WgpuBackend};
use tidewater_engine::scene::{
    Geometry, Material, MaterialId, RenderLayer, Scene, SceneObject,
};

/// Water texture scroll speed in texture units per second.
pub const WATER_SCROLL: Vec2 = Vec2::new(0.1, 0.02);

pub struct Pond {
    pub water: MaterialId,
}

fn hills_height(x: f32, z: f32) -> f32 {
    0.3 * (z * (0.1 * x).sin() + x * (0.1 * z).cos())
}

fn hills_normal(x: f32, z: f32) -> Vec3 {
    Vec3::new(
        -0.03 * z * (0.1 * x).cos() - 0.3 * (0.1 * z).cos(),
        1.0,
        -0.3 * (0.1 * x).sin() + 0.03 * x * (0.1 * z).sin(),
    )
    .normalize()
}

// ── meshes ────────────────────────────────────────────────────────────────

/// `rows x cols` grid on the XZ plane, centred at the origin.
fn grid(width: f32, depth: f32, rows: u32, cols: u32) -> (Vec<Vertex>, Vec<u32>) {
    let dx = width / (cols - 1) as f32;
    let dz = depth / (rows - 1) as f32;

    let mut vertices = Vec::with_capacity((rows * cols) as usize);
    for i in 0..rows {
        for j in 0..cols {
            let x = -0.5 * width + j as f32 * dx;
            let z = 0.5 * depth - i as f32 * dz;
            vertices.push(Vertex::new(
                Vec3::new(x, hills_height(x, z), z),
                hills_normal(x, z),
                Vec2::new(j as f32 / (cols - 1) as f32, i as f32 / (rows - 1) as f32),
            ));
        }
    }

    let mut indices = Vec::with_capacity(6 * ((rows - 1) * (cols - 1)) as usize);
    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            indices.extend_from_slice(&[
                i * cols + j,
                i * cols + j + 1,
                (i + 1) * cols + j,
                (i + 1) * cols + j,
                i * cols + j + 1,
                (i + 1) * cols + j + 1,
            ]);
        }
    }
    (vertices, indices)
}

/// Axis-aligned box centred at the origin, four vertices per face.
fn cuboid(size: Vec3) -> (Vec<Vertex>, Vec<u32>) {
    let h = 0.5 * size;
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let base = vertices.len() as u32;
        for (u, v) in [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)] {
            let p = normal + right * (2.0 * u - 1.0) + up * (1.0 - 2.0 * v);
            vertices.push(Vertex::new(p * h, normal, Vec2::new(u, v)));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

// ── scene ─────────────────────────────────────────────────────────────────

pub fn build(scene: &mut Scene, backend: &mut WgpuBackend) -> Result<Pond> {
    let materials = [
        Material::new("grass").with_fresnel(Vec3::splat(0.01)).with_roughness(0.125),
        Material::new("water")
            .with_albedo(Vec4::new(1.0, 1.0, 1.0, 0.5))
            .with_fresnel(Vec3::splat(0.1))
            .with_roughness(0.0),
        Material::new("wirefence").with_fresnel(Vec3::splat(0.02)).with_roughness(0.25),
        Material::new("bricks").with_fresnel(Vec3::splat(0.02)).with_roughness(0.25),
        Material::new("tiles").with_fresnel(Vec3::splat(0.02)).with_roughness(0.25),
    ];
    for m in materials {
        scene.add_material(m).context("failed to register material")?;
    }

    let material = |name: &str| {
        scene
            .find_material(name)
            .with_context(|| format!("material {name:?} missing"))
    };
    let grass = material("grass")?;
    let water = material("water")?;
    let wirefence = material("wirefence")?;
    let bricks = material("bricks")?;
    let tiles = material("tiles")?;

    let (v, i) = grid(160.0, 160.0, 50, 50);
    let land = backend.upload_mesh("land", &v, &i);
    let (v, i) = cuboid(Vec3::splat(8.0));
    let crate_box = backend.upload_mesh("crate", &v, &i);
    let (v, i) = cuboid(Vec3::new(20.0, 6.0, 1.0));
    let wall = backend.upload_mesh("wall", &v, &i);
    let (v, i) = cuboid(Vec3::new(3.0, 10.0, 3.0));
    let tower = backend.upload_mesh("tower", &v, &i);

    let tex_scale = Mat4::from_scale(Vec3::new(5.0, 5.0, 1.0));
    let objects = [
        SceneObject::new(Geometry::Waves, water, RenderLayer::Transparent)
            .with_tex_transform(tex_scale),
        SceneObject::new(Geometry::Static(land), grass, RenderLayer::Opaque)
            .with_tex_transform(tex_scale),
        SceneObject::new(Geometry::Static(crate_box), wirefence, RenderLayer::AlphaTested)
            .with_world(Mat4::from_translation(Vec3::new(3.0, 2.0, -9.0))),
        SceneObject::new(Geometry::Static(wall), bricks, RenderLayer::Opaque)
            .with_world(Mat4::from_translation(Vec3::new(0.0, 3.0, 20.0))),
        SceneObject::new(Geometry::Static(wall), bricks, RenderLayer::Opaque).with_world(
            Mat4::from_rotation_translation(
                glam::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                Vec3::new(10.0, 3.0, 10.0),
            ),
        ),
        SceneObject::new(Geometry::Static(tower), tiles, RenderLayer::Opaque)
            .with_world(Mat4::from_translation(Vec3::new(10.0, 5.0, 20.0))),
    ];
    for o in objects {
        scene.add_object(o).context("failed to register scene object")?;
    }

    log::info!(
        "pond scene built: {} objects, {} materials, {} meshes",
        scene.object_count(),
        scene.material_count(),
        backend.mesh_count()
    );
    Ok(Pond { water })
}
