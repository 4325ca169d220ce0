use crate::sync::{FrameResourceSlot, RingError, SlotCapacity};

use super::dirty::propagate_if_dirty;
use super::draw::SortKey;
use super::{DrawItem, DrawList, Material, SceneError, SceneObject, Tracked};

/// Handle of a registered object; also its constant-block index in every slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub u32);

/// Handle of a registered material; also its constant-block index in every slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MaterialId(pub u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MaterialId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Number of constant blocks written by one [`Scene::propagate`] call.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Propagation {
    pub objects: usize,
    pub materials: usize,
}

/// Objects and materials bound for the GPU, each tracked for re-upload.
///
/// Names are only used to resolve materials while the scene is being built;
/// per-frame code addresses everything through the integer handles.
#[derive(Debug)]
pub struct Scene {
    ring_depth: usize,
    capacity: SlotCapacity,
    objects: Vec<Tracked<SceneObject>>,
    materials: Vec<Tracked<Material>>,
    draws: DrawList,
}

impl Scene {
    pub fn new(ring_depth: usize, capacity: SlotCapacity) -> Self {
        Self {
            ring_depth,
            capacity,
            objects: Vec::new(),
            materials: Vec::new(),
            draws: DrawList::new(),
        }
    }

    #[inline]
    pub fn ring_depth(&self) -> usize {
        self.ring_depth
    }

    #[inline]
    pub fn capacity(&self) -> SlotCapacity {
        self.capacity
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        if self.materials.len() >= self.capacity.max_materials {
            return Err(SceneError::CapacityExceeded {
                kind: "materials",
                capacity: self.capacity.max_materials,
            });
        }
        if self.find_material(&material.name).is_some() {
            return Err(SceneError::DuplicateMaterial(material.name));
        }

        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(Tracked::new(material, self.ring_depth));
        Ok(id)
    }

    pub fn add_object(&mut self, object: SceneObject) -> Result<ObjectId, SceneError> {
        if self.objects.len() >= self.capacity.max_objects {
            return Err(SceneError::CapacityExceeded {
                kind: "objects",
                capacity: self.capacity.max_objects,
            });
        }
        if object.material.index() >= self.materials.len() {
            return Err(SceneError::UnknownMaterial(object.material));
        }

        let id = ObjectId(self.objects.len() as u32);
        self.draws.push(DrawItem {
            key: SortKey { layer: object.layer, order: id.0 },
            object: id,
            material: object.material,
            geometry: object.geometry,
        });
        self.objects.push(Tracked::new(object, self.ring_depth));
        Ok(id)
    }

    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.get().name == name)
            .map(|i| MaterialId(i as u32))
    }

    pub fn object(&self, id: ObjectId) -> Result<&Tracked<SceneObject>, SceneError> {
        self.objects.get(id.index()).ok_or(SceneError::UnknownObject(id))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Tracked<Material>, SceneError> {
        self.materials.get(id.index()).ok_or(SceneError::UnknownMaterial(id))
    }

    /// Mutates an object's constants. Material and layer are fixed at registration.
    pub fn update_object<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut SceneObject) -> R,
    ) -> Result<R, SceneError> {
        let tracked = self
            .objects
            .get_mut(id.index())
            .ok_or(SceneError::UnknownObject(id))?;

        let (material, layer, geometry) = {
            let o = tracked.get();
            (o.material, o.layer, o.geometry)
        };
        Ok(tracked.update(|o| {
            let r = f(o);
            o.material = material;
            o.layer = layer;
            o.geometry = geometry;
            r
        }))
    }

    pub fn update_material<R>(
        &mut self,
        id: MaterialId,
        f: impl FnOnce(&mut Material) -> R,
    ) -> Result<R, SceneError> {
        self.materials
            .get_mut(id.index())
            .map(|m| m.update(f))
            .ok_or(SceneError::UnknownMaterial(id))
    }

    pub fn mark_object_changed(&mut self, id: ObjectId) -> Result<(), SceneError> {
        self.objects
            .get_mut(id.index())
            .map(Tracked::mark_changed)
            .ok_or(SceneError::UnknownObject(id))
    }

    pub fn mark_material_changed(&mut self, id: MaterialId) -> Result<(), SceneError> {
        self.materials
            .get_mut(id.index())
            .map(Tracked::mark_changed)
            .ok_or(SceneError::UnknownMaterial(id))
    }

    /// Copies every dirty object and material into `slot`.
    pub fn propagate(&mut self, slot: &mut FrameResourceSlot) -> Result<Propagation, RingError> {
        let mut out = Propagation::default();

        for (i, object) in self.objects.iter_mut().enumerate() {
            if propagate_if_dirty(object, i, &mut slot.objects)? {
                out.objects += 1;
            }
        }
        for (i, material) in self.materials.iter_mut().enumerate() {
            if propagate_if_dirty(material, i, &mut slot.materials)? {
                out.materials += 1;
            }
        }

        Ok(out)
    }

    #[inline]
    pub fn draw_list(&self) -> &DrawList {
        &self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, MeshId, RenderLayer};
    use crate::sync::{FrameResourceRing, SyncFence};
    use glam::{Mat4, Vec3};

    fn capacity() -> SlotCapacity {
        SlotCapacity { max_objects: 2, max_materials: 2, max_vertices: 0 }
    }

    fn scene_with_box() -> (Scene, ObjectId, MaterialId) {
        let mut scene = Scene::new(3, capacity());
        let mat = scene.add_material(Material::new("bricks")).unwrap();
        let obj = scene
            .add_object(SceneObject::new(Geometry::Static(MeshId(0)), mat, RenderLayer::Opaque))
            .unwrap();
        (scene, obj, mat)
    }

    // ── registration ──────────────────────────────────────────────────────

    #[test]
    fn handles_are_dense_indices() {
        let (mut scene, obj, mat) = scene_with_box();
        assert_eq!(obj, ObjectId(0));
        assert_eq!(mat, MaterialId(0));
        assert_eq!(scene.add_material(Material::new("water")).unwrap(), MaterialId(1));
        assert_eq!(scene.find_material("water"), Some(MaterialId(1)));
        assert_eq!(scene.find_material("lava"), None);
    }

    #[test]
    fn capacity_is_enforced() {
        let (mut scene, _, mat) = scene_with_box();
        scene
            .add_object(SceneObject::new(Geometry::Waves, mat, RenderLayer::Transparent))
            .unwrap();
        let err = scene
            .add_object(SceneObject::new(Geometry::Waves, mat, RenderLayer::Transparent))
            .unwrap_err();
        assert_eq!(err, SceneError::CapacityExceeded { kind: "objects", capacity: 2 });
    }

    #[test]
    fn unknown_and_duplicate_materials_are_rejected() {
        let (mut scene, _, _) = scene_with_box();
        let err = scene
            .add_object(SceneObject::new(Geometry::Waves, MaterialId(7), RenderLayer::Opaque))
            .unwrap_err();
        assert_eq!(err, SceneError::UnknownMaterial(MaterialId(7)));
        assert_eq!(
            scene.add_material(Material::new("bricks")).unwrap_err(),
            SceneError::DuplicateMaterial("bricks".into())
        );
    }

    #[test]
    fn update_keeps_registration_fields() {
        let (mut scene, obj, _) = scene_with_box();
        scene
            .update_object(obj, |o| {
                o.layer = RenderLayer::Transparent;
                o.world = Mat4::from_translation(Vec3::X);
            })
            .unwrap();
        let o = scene.object(obj).unwrap().get();
        assert_eq!(o.layer, RenderLayer::Opaque);
        assert_eq!(o.world, Mat4::from_translation(Vec3::X));
    }

    // ── propagation ───────────────────────────────────────────────────────

    #[test]
    fn change_reaches_every_slot_then_stops() {
        let (mut scene, obj, _) = scene_with_box();
        let fence = SyncFence::new();
        let mut ring = FrameResourceRing::new(3, capacity()).unwrap();

        // Drain the initial upload.
        for _ in 0..3 {
            scene.propagate(ring.advance(&fence).unwrap()).unwrap();
        }

        let world = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        scene.update_object(obj, |o| o.world = world).unwrap();
        assert_eq!(scene.object(obj).unwrap().counter().frames_dirty(), 3);

        for _ in 0..3 {
            let slot = ring.advance(&fence).unwrap();
            let p = scene.propagate(slot).unwrap();
            assert_eq!(p, Propagation { objects: 1, materials: 0 });
        }
        assert_eq!(scene.object(obj).unwrap().counter().frames_dirty(), 0);
        for slot in ring.slots() {
            assert_eq!(slot.objects.read(0).unwrap().world, world.to_cols_array_2d());
        }

        let slot = ring.advance(&fence).unwrap();
        let writes = slot.objects.write_count();
        assert_eq!(scene.propagate(slot).unwrap(), Propagation::default());
        assert_eq!(slot.objects.write_count(), writes);
    }

    #[test]
    fn last_write_wins() {
        let (mut scene, _, mat) = scene_with_box();
        let fence = SyncFence::new();
        let mut ring = FrameResourceRing::new(3, capacity()).unwrap();

        scene.propagate(ring.advance(&fence).unwrap()).unwrap();
        scene.update_material(mat, |m| m.roughness = 0.5).unwrap();
        scene.update_material(mat, |m| m.roughness = 0.9).unwrap();
        assert_eq!(scene.material(mat).unwrap().counter().frames_dirty(), 3);

        for _ in 0..3 {
            scene.propagate(ring.advance(&fence).unwrap()).unwrap();
        }
        for slot in ring.slots() {
            assert_eq!(slot.materials.read(0).unwrap().roughness, 0.9);
        }
    }

    #[test]
    fn unknown_handles_error() {
        let (mut scene, _, _) = scene_with_box();
        assert_eq!(
            scene.mark_object_changed(ObjectId(9)).unwrap_err(),
            SceneError::UnknownObject(ObjectId(9))
        );
        assert!(scene.mark_material_changed(MaterialId(0)).is_ok());
    }
}
