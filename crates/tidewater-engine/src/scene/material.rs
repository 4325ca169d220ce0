use glam::{Mat4, Vec3, Vec4};

use crate::render::MaterialConstants;

use super::GpuConstants;

/// Surface parameters shared by every object drawn with this material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse_albedo: Vec4,
    pub fresnel_r0: Vec3,
    pub roughness: f32,
    /// Applied to texture coordinates after the object's own texture transform.
    pub mat_transform: Mat4,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_albedo: Vec4::ONE,
            fresnel_r0: Vec3::splat(0.01),
            roughness: 0.25,
            mat_transform: Mat4::IDENTITY,
        }
    }

    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.diffuse_albedo = albedo;
        self
    }

    pub fn with_fresnel(mut self, fresnel_r0: Vec3) -> Self {
        self.fresnel_r0 = fresnel_r0;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Current texture scroll offset (translation part of `mat_transform`).
    pub fn scroll_offset(&self) -> (f32, f32) {
        (self.mat_transform.w_axis.x, self.mat_transform.w_axis.y)
    }

    /// Scrolls the texture by `(du, dv)`, wrapping each offset into `[0, 1)`.
    pub fn scroll(&mut self, du: f32, dv: f32) {
        let t = &mut self.mat_transform.w_axis;
        t.x = (t.x + du).rem_euclid(1.0);
        t.y = (t.y + dv).rem_euclid(1.0);
    }
}

impl GpuConstants for Material {
    type Constants = MaterialConstants;

    fn gpu_constants(&self) -> MaterialConstants {
        MaterialConstants {
            diffuse_albedo: self.diffuse_albedo.to_array(),
            fresnel_r0: self.fresnel_r0.to_array(),
            roughness: self.roughness,
            mat_transform: self.mat_transform.to_cols_array_2d(),
        }
    }
}
