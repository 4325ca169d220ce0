//! GPU wire layouts shared by the frame slots, the scene store and the shader.
//!
//! Matrices are stored column-major, which is what WGSL `mat4x4<f32>` expects.
//! Field order and padding mirror `shaders/scene.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Number of lights carried by [`PassConstants`].
pub const MAX_LIGHTS: usize = 3;

// ── vertex ────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // tex_coord
    ];

    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── per-object ────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    pub tex_transform: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn new(world: Mat4, tex_transform: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            tex_transform: tex_transform.to_cols_array_2d(),
        }
    }
}

// ── per-material ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub diffuse_albedo: [f32; 4],
    pub fresnel_r0: [f32; 3],
    pub roughness: f32,
    pub mat_transform: [[f32; 4]; 4],
}

// ── per-pass ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub strength: [f32; 3],
    pub falloff_start: f32,
    pub direction: [f32; 3],
    pub falloff_end: f32,
    pub position: [f32; 3],
    pub spot_power: f32,
}

impl Light {
    pub fn directional(direction: Vec3, strength: Vec3) -> Self {
        Self {
            strength: strength.to_array(),
            direction: direction.normalize_or_zero().to_array(),
            ..Self::default()
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    pub view: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye_pos: [f32; 3],
    pub _pad0: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient_light: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_start: f32,
    pub fog_range: f32,
    pub _pad1: [f32; 2],
    pub lights: [Light; MAX_LIGHTS],
}

/// Camera and frame inputs used to build [`PassConstants`].
#[derive(Debug, Copy, Clone)]
pub struct PassInputs {
    pub view: Mat4,
    pub proj: Mat4,
    pub eye: Vec3,
    pub target_size: (u32, u32),
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient: Vec4,
    /// Also the color the frame is cleared to.
    pub fog_color: Vec4,
    pub fog_start: f32,
    pub fog_range: f32,
    pub lights: [Light; MAX_LIGHTS],
}

impl Default for PassInputs {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            target_size: (1, 1),
            near_z: 1.0,
            far_z: 1000.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient: Vec4::new(0.25, 0.25, 0.35, 1.0),
            fog_color: Vec4::new(0.7, 0.7, 0.7, 1.0),
            fog_start: 5.0,
            fog_range: 150.0,
            lights: [
                Light::directional(Vec3::new(0.57735, -0.57735, 0.57735), Vec3::splat(0.6)),
                Light::directional(Vec3::new(-0.57735, -0.57735, 0.57735), Vec3::splat(0.3)),
                Light::directional(Vec3::new(0.0, -0.707, -0.707), Vec3::splat(0.15)),
            ],
        }
    }
}

impl PassConstants {
    pub fn from_inputs(p: &PassInputs) -> Self {
        let view_proj = p.proj * p.view;
        let (w, h) = (p.target_size.0.max(1) as f32, p.target_size.1.max(1) as f32);
        Self {
            view: p.view.to_cols_array_2d(),
            inv_view: p.view.inverse().to_cols_array_2d(),
            proj: p.proj.to_cols_array_2d(),
            inv_proj: p.proj.inverse().to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            eye_pos: p.eye.to_array(),
            _pad0: 0.0,
            render_target_size: [w, h],
            inv_render_target_size: [1.0 / w, 1.0 / h],
            near_z: p.near_z,
            far_z: p.far_z,
            total_time: p.total_time,
            delta_time: p.delta_time,
            ambient_light: p.ambient.to_array(),
            fog_color: p.fog_color.to_array(),
            fog_start: p.fog_start,
            fog_range: p.fog_range.max(f32::EPSILON),
            _pad1: [0.0; 2],
            lights: p.lights,
        }
    }
}

impl Default for PassConstants {
    fn default() -> Self {
        Self::from_inputs(&PassInputs::default())
    }
}
