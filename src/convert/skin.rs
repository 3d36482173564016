//! Skeleton and vertex-blend building.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::warn;

use crate::document::Document;
use crate::math::Mat4;
use crate::scene::{BlendEntry, BlendTable, Joint, JointHandle, Skeleton, VertexBlend};

use super::accessor;
use super::error::ConvertError;
use super::Converter;

/// Joints influencing one vertex. The document stores four slots per
/// vertex; unused slots carry zero weight.
const INFLUENCES_PER_VERTEX: usize = 4;

impl Converter {
    /// Build (or rebuild) the skeleton for a skin and the per-vertex
    /// blend data of the mesh being built.
    ///
    /// Returns the interned blend table plus one row index per vertex, or
    /// `None` when the skin is unusable.
    pub(super) fn build_skin(
        &mut self,
        skin_id: &str,
        owner_id: &str,
        joints_acc: &str,
        weights_acc: &str,
    ) -> Result<Option<(Rc<BlendTable>, Vec<u32>)>, ConvertError> {
        let Some(skin) = self.document.skins.get(skin_id).cloned() else {
            warn!("node '{owner_id}' references unknown skin '{skin_id}'");
            return Ok(None);
        };

        // glTF stores absolute inverse bind matrices, one per joint.
        let bind_matrices = match &skin.inverse_bind_matrices {
            Some(accessor_id) => {
                accessor::decode_mat4s(&mut self.buffers, &self.document, accessor_id)?
            }
            None => vec![Mat4::identity(); skin.joints.len()],
        };
        if bind_matrices.len() < skin.joints.len() {
            return Err(ConvertError::Accessor(format!(
                "skin '{skin_id}' declares {} joints but {} inverse bind matrices",
                skin.joints.len(),
                bind_matrices.len()
            )));
        }
        let joint_indices: HashMap<&str, usize> = skin
            .joints
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();

        // The walk starts at the recorded skeleton root, or at the owning
        // node's children when the exporter left it out.
        let roots: Vec<String> = match &skin.skeleton {
            Some(root) => vec![root.clone()],
            None => self
                .document
                .nodes
                .get(owner_id)
                .map(|node| node.children.clone())
                .unwrap_or_default(),
        };

        let name = skin.name.clone().unwrap_or_else(|| skin_id.to_string());
        let mut skeleton = Skeleton::new(name);
        let mut joint_nodes = HashMap::new();
        let mut visited = HashSet::new();
        for root in &roots {
            let built = walk_joint(
                &self.document,
                root,
                &Mat4::identity(),
                &joint_indices,
                &bind_matrices,
                &mut skeleton,
                &mut joint_nodes,
                &mut visited,
            );
            if let Some(joint) = built {
                skeleton.roots.push(joint);
            }
        }
        if skeleton.roots.is_empty() {
            warn!("skin '{skin_id}' produced no joints");
            return Ok(None);
        }

        skeleton.clips = self.bake_clips(&joint_nodes)?;

        let blend = self.build_blend_data(skin_id, &skeleton, joints_acc, weights_acc)?;

        match self.characters.get(skin_id) {
            Some(existing) => *existing.borrow_mut() = skeleton,
            None => {
                self.characters
                    .insert(skin_id.to_string(), Rc::new(RefCell::new(skeleton)));
            }
        }
        Ok(Some(blend))
    }

    /// Decode the joint/weight accessors into an interned blend table and
    /// a per-vertex row index.
    fn build_blend_data(
        &mut self,
        skin_id: &str,
        skeleton: &Skeleton,
        joints_acc: &str,
        weights_acc: &str,
    ) -> Result<(Rc<BlendTable>, Vec<u32>), ConvertError> {
        let joints = accessor::decode_u32s(&mut self.buffers, &self.document, joints_acc)?;
        let weights = accessor::decode_floats(&mut self.buffers, &self.document, weights_acc)?;
        if joints.len() != weights.len() {
            return Err(ConvertError::Accessor(format!(
                "skin '{skin_id}' has {} joint slots but {} weight slots",
                joints.len(),
                weights.len()
            )));
        }

        let mut table = BlendTable::default();
        let mut interned: HashMap<Vec<(u32, u32)>, u32> = HashMap::new();
        let mut rows = Vec::with_capacity(joints.len() / INFLUENCES_PER_VERTEX);
        for (vertex_joints, vertex_weights) in joints
            .chunks_exact(INFLUENCES_PER_VERTEX)
            .zip(weights.chunks_exact(INFLUENCES_PER_VERTEX))
        {
            let mut key = Vec::new();
            let mut entries = Vec::new();
            for (&joint, &weight) in vertex_joints.iter().zip(vertex_weights) {
                if weight <= 0.0 {
                    continue;
                }
                if !skeleton.vertex_transforms.contains_key(&(joint as usize)) {
                    warn!(
                        "skin '{skin_id}' weights vertex against joint {joint} which has no transform, skipping"
                    );
                    continue;
                }
                key.push((joint, weight.to_bits()));
                entries.push(BlendEntry {
                    joint: joint as usize,
                    weight,
                });
            }
            key.sort_unstable();
            let row = match interned.get(&key) {
                Some(&row) => row,
                None => {
                    let row = table.rows.len() as u32;
                    table.rows.push(VertexBlend { entries });
                    interned.insert(key, row);
                    row
                }
            };
            rows.push(row);
        }
        Ok((Rc::new(table), rows))
    }
}

/// Recursively build one joint and its children.
///
/// Joints listed in the skin deform vertices: their bind pose comes from
/// the inverse bind matrix, made local by unwinding the accumulated parent
/// transform. Joints outside the list keep their node transform so
/// relative poses stay correct, but receive no vertex-transform entry.
#[allow(clippy::too_many_arguments)]
fn walk_joint(
    document: &Document,
    node_id: &str,
    parent_world: &Mat4,
    joint_indices: &HashMap<&str, usize>,
    bind_matrices: &[Mat4],
    skeleton: &mut Skeleton,
    joint_nodes: &mut HashMap<String, String>,
    visited: &mut HashSet<String>,
) -> Option<JointHandle> {
    if !visited.insert(node_id.to_string()) {
        warn!("joint hierarchy revisits node '{node_id}', cycle broken");
        return None;
    }
    let Some(node) = document.nodes.get(node_id) else {
        warn!("joint hierarchy references unknown node '{node_id}'");
        return None;
    };
    let joint_name = node
        .joint_name
        .clone()
        .or_else(|| node.name.clone())
        .unwrap_or_else(|| node_id.to_string());

    let parent_inverse = parent_world.try_inverse().unwrap_or_else(Mat4::identity);
    let (joint, world) = match joint_indices.get(node_id) {
        Some(&index) => {
            let inverse_bind = bind_matrices[index];
            let world_bind = match inverse_bind.try_inverse() {
                Some(world) => world,
                None => {
                    warn!("joint '{joint_name}' has a singular inverse bind matrix");
                    Mat4::identity()
                }
            };
            let bind_local = parent_inverse * world_bind;
            let handle = Joint::new(joint_name.clone(), bind_local, inverse_bind).into_handle();
            skeleton
                .vertex_transforms
                .insert(index, Rc::clone(&handle));
            (handle, world_bind)
        }
        None => {
            let bind_local = node.local_matrix();
            let world = parent_world * bind_local;
            let inverse_world = world.try_inverse().unwrap_or_else(Mat4::identity);
            let handle = Joint::new(joint_name.clone(), bind_local, inverse_world).into_handle();
            (handle, world)
        }
    };
    joint_nodes.insert(node_id.to_string(), joint_name);

    for child in &node.children {
        let built = walk_joint(
            document,
            child,
            &world,
            joint_indices,
            bind_matrices,
            skeleton,
            joint_nodes,
            visited,
        );
        if let Some(child_joint) = built {
            joint.borrow_mut().children.push(child_joint);
        }
    }
    Some(joint)
}
