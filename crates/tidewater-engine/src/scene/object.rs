use glam::Mat4;

use crate::render::ObjectConstants;

use super::{GpuConstants, MaterialId};

/// Handle of a static mesh uploaded to the backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(pub u32);

/// Vertex source of a scene object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Geometry {
    /// Immutable mesh owned by the backend.
    Static(MeshId),
    /// The simulated water surface, re-streamed into every slot each tick.
    Waves,
}

/// Draw buckets, drawn in declaration order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RenderLayer {
    Opaque,
    AlphaTested,
    /// Alpha-blended, drawn last.
    Transparent,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 3] = [Self::Opaque, Self::AlphaTested, Self::Transparent];
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub world: Mat4,
    pub tex_transform: Mat4,
    pub material: MaterialId,
    pub geometry: Geometry,
    pub layer: RenderLayer,
}

impl SceneObject {
    pub fn new(geometry: Geometry, material: MaterialId, layer: RenderLayer) -> Self {
        Self {
            world: Mat4::IDENTITY,
            tex_transform: Mat4::IDENTITY,
            material,
            geometry,
            layer,
        }
    }

    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    pub fn with_tex_transform(mut self, tex_transform: Mat4) -> Self {
        self.tex_transform = tex_transform;
        self
    }
}

impl GpuConstants for SceneObject {
    type Constants = ObjectConstants;

    fn gpu_constants(&self) -> ObjectConstants {
        ObjectConstants::new(self.world, self.tex_transform)
    }
}
