//! Mesh geometry building.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::material::RenderState;
use crate::mesh::{ColumnSemantic, GeomMesh, IndexData, VertexLayout};

use super::accessor;
use super::error::ConvertError;
use super::Converter;

impl Converter {
    /// Rebuild one mesh under its retained handle.
    ///
    /// The vertex layout is taken from the first primitive's attribute
    /// set; every primitive of a mesh is required to share it. Vertex
    /// bytes are bulk-copied from the position accessor's buffer view,
    /// which must hold the complete interleaved array.
    pub(super) fn load_mesh(&mut self, mesh_id: &str) -> Result<(), ConvertError> {
        let Some(def) = self.document.meshes.get(mesh_id).cloned() else {
            return Ok(());
        };
        let handle = Rc::clone(
            self.meshes
                .entry(mesh_id.to_string())
                .or_insert_with(|| Rc::new(RefCell::new(GeomMesh::new(mesh_id)))),
        );
        handle.borrow_mut().clear_geoms();

        // Rebuilding drops this mesh's old bindings so the back-map never
        // accumulates duplicates.
        for pairs in self.mat_mesh_map.values_mut() {
            pairs.retain(|(bound_mesh, _)| bound_mesh != mesh_id);
        }

        let Some(first) = def.primitives.first().cloned() else {
            return Ok(());
        };
        let Some(position_acc) = first.attributes.get("POSITION").cloned() else {
            warn!("mesh '{mesh_id}' has no POSITION attribute, skipping");
            return Ok(());
        };
        let vertex_count = accessor::element_count(&self.document, &position_acc)?;

        let joints_acc = first
            .attributes
            .get("JOINTS_0")
            .or_else(|| first.attributes.get("JOINT"))
            .cloned();
        let weights_acc = first
            .attributes
            .get("WEIGHTS_0")
            .or_else(|| first.attributes.get("WEIGHT"))
            .cloned();

        // A skinned mesh needs an owning node that binds the skin.
        let skin_binding = match (&joints_acc, &weights_acc) {
            (Some(_), Some(_)) => {
                let owner = self.document.nodes.iter().find_map(|(node_id, node)| {
                    let owns = node.meshes.iter().any(|m| m == mesh_id);
                    match (&node.skin, owns) {
                        (Some(skin), true) => Some((node_id.clone(), skin.clone())),
                        _ => None,
                    }
                });
                if owner.is_none() {
                    warn!("mesh '{mesh_id}' has skin weights but no node binds a skin to it");
                }
                owner
            }
            _ => None,
        };

        let mut layout = VertexLayout::position_normal();
        for (attribute, accessor_id) in &first.attributes {
            let arity = self
                .document
                .accessors
                .get(accessor_id)
                .map(|a| a.kind.arity());
            if let Some(layer) = attribute.strip_prefix("TEXCOORD_") {
                layout =
                    layout.with_column(ColumnSemantic::TexCoord(layer.to_string()), arity.unwrap_or(2));
            } else if let Some(layer) = attribute.strip_prefix("COLOR_") {
                layout =
                    layout.with_column(ColumnSemantic::Color(layer.to_string()), arity.unwrap_or(4));
            }
        }
        let blend = match &skin_binding {
            Some((owner_id, skin_id)) => {
                let joints = joints_acc.as_deref().unwrap_or_default();
                let weights = weights_acc.as_deref().unwrap_or_default();
                self.build_skin(skin_id, owner_id, joints, weights)?
            }
            None => None,
        };
        // An unusable skin degrades the mesh to unskinned, so the blend
        // column exists only once blend data actually came back.
        let source_stride = layout.stride();
        if blend.is_some() {
            layout = layout.with_column(ColumnSemantic::BlendIndex, 1);
        }
        let source = accessor::view_bytes(&mut self.buffers, &self.document, &position_acc)?;
        if source.len() < vertex_count * source_stride {
            return Err(ConvertError::Accessor(format!(
                "mesh '{mesh_id}' vertex data holds {} bytes but {} vertices of stride {source_stride} need {}",
                source.len(),
                vertex_count,
                vertex_count * source_stride
            )));
        }
        let mut data = Vec::with_capacity(vertex_count * layout.stride());
        match &blend {
            Some((_, rows)) => {
                for vertex in 0..vertex_count {
                    let start = vertex * source_stride;
                    data.extend_from_slice(&source[start..start + source_stride]);
                    let row = rows.get(vertex).copied().unwrap_or(0);
                    data.extend_from_slice(&row.to_le_bytes());
                }
            }
            None => data.extend_from_slice(&source[..vertex_count * source_stride]),
        }

        {
            let mut mesh = handle.borrow_mut();
            mesh.set_vertex_data(layout, data, vertex_count);
            if let Some((table, rows)) = blend {
                mesh.set_blend_data(table, rows);
            }
        }

        for (primitive_idx, primitive) in def.primitives.iter().enumerate() {
            let indices = match &primitive.indices {
                Some(accessor_id) => {
                    accessor::decode_indices(&mut self.buffers, &self.document, accessor_id)?
                }
                None => sequential_indices(vertex_count),
            };
            if let Some(max) = indices.max_index() {
                if max as usize >= vertex_count {
                    return Err(ConvertError::Accessor(format!(
                        "mesh '{mesh_id}' primitive {primitive_idx} indexes vertex {max} of {vertex_count}"
                    )));
                }
            }

            let state = match &primitive.material {
                Some(material_id) => match self.mat_states.get(material_id) {
                    Some(state) => Rc::clone(state),
                    None => {
                        warn!(
                            "mesh '{mesh_id}' primitive {primitive_idx} references unknown material '{material_id}', using defaults"
                        );
                        Rc::new(RenderState::empty())
                    }
                },
                None => {
                    warn!(
                        "mesh '{mesh_id}' primitive {primitive_idx} has no material, using defaults"
                    );
                    Rc::new(RenderState::empty())
                }
            };

            let geom_idx = handle.borrow_mut().add_primitive(indices, state);
            if let Some(material_id) = &primitive.material {
                self.mat_mesh_map
                    .entry(material_id.clone())
                    .or_default()
                    .push((mesh_id.to_string(), geom_idx));
            }
        }
        Ok(())
    }
}

fn sequential_indices(vertex_count: usize) -> IndexData {
    if vertex_count <= usize::from(u16::MAX) + 1 {
        IndexData::U16((0..vertex_count).map(|v| v as u16).collect())
    } else {
        IndexData::U32((0..vertex_count).map(|v| v as u32).collect())
    }
}
