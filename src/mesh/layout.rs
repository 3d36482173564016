//! Vertex layout description.

/// What a vertex column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSemantic {
    /// Object-space position.
    Position,
    /// Vertex normal.
    Normal,
    /// Texture coordinates for a named UV layer (empty = default layer).
    TexCoord(String),
    /// Vertex color for a named color layer (empty = default layer).
    Color(String),
    /// Per-vertex index into the mesh's blend table (skinned meshes only).
    BlendIndex,
}

/// One typed column of an interleaved vertex array.
///
/// All columns use 4-byte components: f32 for geometric data, u32 for the
/// blend-index column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexColumn {
    /// What the column holds.
    pub semantic: ColumnSemantic,
    /// Number of components (1–4).
    pub components: usize,
}

impl VertexColumn {
    /// Byte size of one element of this column.
    pub fn byte_size(&self) -> usize {
        self.components * 4
    }
}

/// Ordered set of vertex columns.
///
/// Position and normal columns are always declared first; texcoord and
/// color columns follow in source attribute order; a blend-index column is
/// appended when the mesh is skinned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    columns: Vec<VertexColumn>,
}

impl VertexLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Append a column.
    #[must_use]
    pub fn with_column(mut self, semantic: ColumnSemantic, components: usize) -> Self {
        self.columns.push(VertexColumn {
            semantic,
            components,
        });
        self
    }

    /// The standard position + normal base layout.
    pub fn position_normal() -> Self {
        Self::new()
            .with_column(ColumnSemantic::Position, 3)
            .with_column(ColumnSemantic::Normal, 3)
    }

    /// All columns, in declaration order.
    pub fn columns(&self) -> &[VertexColumn] {
        &self.columns
    }

    /// Byte stride of one interleaved vertex.
    pub fn stride(&self) -> usize {
        self.columns.iter().map(VertexColumn::byte_size).sum()
    }

    /// Whether a column with the given semantic is declared.
    pub fn has(&self, semantic: &ColumnSemantic) -> bool {
        self.columns.iter().any(|c| &c.semantic == semantic)
    }

    /// Names of the declared UV layers, in declaration order.
    pub fn uv_layers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match &c.semantic {
                ColumnSemantic::TexCoord(layer) => Some(layer.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_sums_columns() {
        let layout = VertexLayout::position_normal()
            .with_column(ColumnSemantic::TexCoord("0".into()), 2);
        assert_eq!(layout.stride(), (3 + 3 + 2) * 4);
        assert_eq!(layout.columns().len(), 3);
    }

    #[test]
    fn uv_layer_listing() {
        let layout = VertexLayout::position_normal()
            .with_column(ColumnSemantic::TexCoord("0".into()), 2)
            .with_column(ColumnSemantic::TexCoord("lightmap".into()), 2);
        assert_eq!(layout.uv_layers(), vec!["0", "lightmap"]);
        assert!(!layout.has(&ColumnSemantic::BlendIndex));
    }
}
