use core::cmp::Ordering;

use super::{Geometry, MaterialId, ObjectId, RenderLayer};

/// Stable draw order: layer first, then registration order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SortKey {
    pub layer: RenderLayer,
    pub order: u32,
}

impl Ord for SortKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match self.layer.cmp(&other.layer) {
            Ordering::Equal => self.order.cmp(&other.order),
            o => o,
        }
    }
}

impl PartialOrd for SortKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One draw call: which constant blocks to bind and which vertices to feed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawItem {
    pub key: SortKey,
    pub object: ObjectId,
    pub material: MaterialId,
    pub geometry: Geometry,
}

impl DrawItem {
    #[inline]
    pub fn layer(&self) -> RenderLayer {
        self.key.layer
    }
}

/// Draw stream for a frame, kept in layer order.
///
/// The scene's topology is fixed once built, so the list is rebuilt only when
/// an object is added.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DrawItem) {
        let at = self.items.partition_point(|it| it.key <= item.key);
        self.items.insert(at, item);
    }

    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of one layer, in registration order.
    pub fn layer(&self, layer: RenderLayer) -> &[DrawItem] {
        let start = self.items.partition_point(|it| it.key.layer < layer);
        let end = self.items.partition_point(|it| it.key.layer <= layer);
        &self.items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshId;

    fn item(order: u32, layer: RenderLayer) -> DrawItem {
        DrawItem {
            key: SortKey { layer, order },
            object: ObjectId(order),
            material: MaterialId(0),
            geometry: Geometry::Static(MeshId(0)),
        }
    }

    #[test]
    fn layers_sort_before_registration_order() {
        let mut list = DrawList::new();
        list.push(item(0, RenderLayer::Transparent));
        list.push(item(1, RenderLayer::Opaque));
        list.push(item(2, RenderLayer::AlphaTested));
        list.push(item(3, RenderLayer::Opaque));

        let objects: Vec<u32> = list.items().iter().map(|i| i.object.0).collect();
        assert_eq!(objects, vec![1, 3, 2, 0]);
    }

    #[test]
    fn layer_slices() {
        let mut list = DrawList::new();
        list.push(item(0, RenderLayer::Opaque));
        list.push(item(1, RenderLayer::Transparent));
        assert_eq!(list.layer(RenderLayer::Opaque).len(), 1);
        assert!(list.layer(RenderLayer::AlphaTested).is_empty());
        assert_eq!(list.layer(RenderLayer::Transparent)[0].object, ObjectId(1));
    }
}
