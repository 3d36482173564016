//! Built geometry data.

use std::rc::Rc;

use crate::material::RenderState;
use crate::scene::BlendTable;

use super::layout::VertexLayout;

/// Index width for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned indices (max 65535 vertices).
    #[default]
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// Byte size of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Decoded index data at its native width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// Whether there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The index width.
    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::Uint16,
            Self::U32(_) => IndexFormat::Uint32,
        }
    }

    /// Largest index value, if any.
    pub fn max_index(&self) -> Option<u32> {
        match self {
            Self::U16(v) => v.iter().copied().max().map(u32::from),
            Self::U32(v) => v.iter().copied().max(),
        }
    }

    /// Raw little-endian bytes of the index array.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Indices widened to u32, for inspection.
    pub fn to_u32_vec(&self) -> Vec<u32> {
        match self {
            Self::U16(v) => v.iter().copied().map(u32::from).collect(),
            Self::U32(v) => v.clone(),
        }
    }
}

/// One indexed triangle-list primitive bound to a render state.
#[derive(Debug, Clone)]
pub struct GeomPrimitive {
    /// Triangle indices.
    pub indices: IndexData,
    /// The bound render state, shared with every other user of the same
    /// source material.
    pub state: Rc<RenderState>,
}

/// Built mesh geometry.
///
/// Holds one interleaved vertex byte array (bulk-copied from the source
/// buffer), an optional per-vertex blend column for skinned meshes, and
/// the indexed primitives. Rebuilding for the same id starts from
/// [`clear_geoms`](Self::clear_geoms) so repeated builds are idempotent.
#[derive(Clone)]
pub struct GeomMesh {
    name: String,
    layout: VertexLayout,
    vertex_data: Vec<u8>,
    vertex_count: usize,
    animated: bool,
    blend_table: Option<Rc<BlendTable>>,
    blend_indices: Vec<u32>,
    primitives: Vec<GeomPrimitive>,
}

impl GeomMesh {
    /// Create an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: VertexLayout::new(),
            vertex_data: Vec::new(),
            vertex_count: 0,
            animated: false,
            blend_table: None,
            blend_indices: Vec::new(),
            primitives: Vec::new(),
        }
    }

    /// Drop all built geometry, keeping the name.
    pub fn clear_geoms(&mut self) {
        self.layout = VertexLayout::new();
        self.vertex_data.clear();
        self.vertex_count = 0;
        self.animated = false;
        self.blend_table = None;
        self.blend_indices.clear();
        self.primitives.clear();
    }

    /// Declare the vertex layout and install the bulk-copied vertex bytes.
    pub fn set_vertex_data(&mut self, layout: VertexLayout, data: Vec<u8>, vertex_count: usize) {
        self.layout = layout;
        self.vertex_data = data;
        self.vertex_count = vertex_count;
    }

    /// Mark the mesh as skinned and install its blend column.
    pub fn set_blend_data(&mut self, table: Rc<BlendTable>, indices: Vec<u32>) {
        self.animated = true;
        self.blend_table = Some(table);
        self.blend_indices = indices;
    }

    /// Append a primitive; returns its index within the mesh.
    pub fn add_primitive(&mut self, indices: IndexData, state: Rc<RenderState>) -> usize {
        self.primitives.push(GeomPrimitive { indices, state });
        self.primitives.len() - 1
    }

    /// Replace the render state of one primitive.
    ///
    /// Returns false (and leaves the mesh untouched) when the primitive
    /// index is out of range.
    pub fn set_primitive_state(&mut self, index: usize, state: Rc<RenderState>) -> bool {
        match self.primitives.get_mut(index) {
            Some(primitive) => {
                primitive.state = state;
                true
            }
            None => false,
        }
    }

    /// Mesh name (the source mesh id).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared vertex layout.
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Raw interleaved vertex bytes.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Whether the mesh carries skinning data.
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// The blend table, when skinned.
    pub fn blend_table(&self) -> Option<&Rc<BlendTable>> {
        self.blend_table.as_ref()
    }

    /// Per-vertex blend-table indices, when skinned.
    pub fn blend_indices(&self) -> &[u32] {
        &self.blend_indices
    }

    /// All primitives.
    pub fn primitives(&self) -> &[GeomPrimitive] {
        &self.primitives
    }
}

impl std::fmt::Debug for GeomMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeomMesh")
            .field("name", &self.name)
            .field("vertex_count", &self.vertex_count)
            .field("stride", &self.layout.stride())
            .field("animated", &self.animated)
            .field("primitives", &self.primitives.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ColumnSemantic;

    #[test]
    fn index_data_widths() {
        let narrow = IndexData::U16(vec![0, 1, 2]);
        assert_eq!(narrow.format(), IndexFormat::Uint16);
        assert_eq!(narrow.len(), 3);
        assert_eq!(narrow.max_index(), Some(2));
        assert_eq!(narrow.as_bytes().len(), 6);

        let wide = IndexData::U32(vec![0, 1, 70000]);
        assert_eq!(wide.format(), IndexFormat::Uint32);
        assert_eq!(wide.max_index(), Some(70000));
        assert_eq!(wide.to_u32_vec(), vec![0, 1, 70000]);
    }

    #[test]
    fn clear_geoms_resets_everything() {
        let mut mesh = GeomMesh::new("m");
        let layout = VertexLayout::position_normal();
        mesh.set_vertex_data(layout, vec![0u8; 24 * 3], 3);
        mesh.add_primitive(
            IndexData::U16(vec![0, 1, 2]),
            Rc::new(RenderState::empty()),
        );
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.primitives().len(), 1);

        mesh.clear_geoms();
        assert_eq!(mesh.name(), "m");
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.primitives().is_empty());
        assert!(!mesh.layout().has(&ColumnSemantic::Position));
    }

    #[test]
    fn set_primitive_state_bounds() {
        let mut mesh = GeomMesh::new("m");
        mesh.add_primitive(
            IndexData::U16(vec![0, 1, 2]),
            Rc::new(RenderState::empty()),
        );
        assert!(mesh.set_primitive_state(0, Rc::new(RenderState::empty())));
        assert!(!mesh.set_primitive_state(5, Rc::new(RenderState::empty())));
    }
}
