//! Skeletons, vertex blending and baked animation clips.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::math::Mat4;

/// Shared handle to a joint.
pub type JointHandle = Rc<RefCell<Joint>>;

/// One joint of a skeleton hierarchy.
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// Bind-pose transform relative to the parent joint.
    pub bind_local: Mat4,
    /// World-to-joint bind matrix, kept for deforming joints.
    pub inverse_world_bind: Mat4,
    pub children: Vec<JointHandle>,
}

impl Joint {
    pub fn new(name: impl Into<String>, bind_local: Mat4, inverse_world_bind: Mat4) -> Self {
        Self {
            name: name.into(),
            bind_local,
            inverse_world_bind,
            children: Vec::new(),
        }
    }

    /// Wrap a joint in a shared handle.
    pub fn into_handle(self) -> JointHandle {
        Rc::new(RefCell::new(self))
    }
}

/// A built skeleton: the joint hierarchy, the mapping from source joint
/// indices to deforming joints, and the clips baked against it.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub name: String,
    pub roots: Vec<JointHandle>,
    /// Source joint index → deforming joint. Joints that deform no
    /// vertices have no entry.
    pub vertex_transforms: HashMap<usize, JointHandle>,
    pub clips: Vec<BakedClip>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Find a joint by name anywhere in the hierarchy.
    pub fn find_joint(&self, name: &str) -> Option<JointHandle> {
        fn walk(joint: &JointHandle, name: &str) -> Option<JointHandle> {
            if joint.borrow().name == name {
                return Some(Rc::clone(joint));
            }
            joint
                .borrow()
                .children
                .iter()
                .find_map(|child| walk(child, name))
        }
        self.roots.iter().find_map(|root| walk(root, name))
    }

    /// Total joint count across all roots.
    pub fn joint_count(&self) -> usize {
        fn count(joint: &JointHandle) -> usize {
            1 + joint.borrow().children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }
}

/// One (joint, weight) pair of a vertex blend.
#[derive(Debug, Clone)]
pub struct BlendEntry {
    /// Index into the source skin's joint list, the key used in
    /// [`Skeleton::vertex_transforms`].
    pub joint: usize,
    pub weight: f32,
}

/// One deduplicated combination of joint weights.
#[derive(Debug, Clone, Default)]
pub struct VertexBlend {
    pub entries: Vec<BlendEntry>,
}

impl VertexBlend {
    /// Sum of the blend weights. 1.0 for well-formed source data.
    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

/// Table of unique vertex blends. Each skinned vertex stores one index
/// into this table instead of its own weight list.
#[derive(Debug, Clone, Default)]
pub struct BlendTable {
    pub rows: Vec<VertexBlend>,
}

impl BlendTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-joint sampled values of a baked clip. All frame vectors have the
/// clip's frame count; rotations are Euler angles in degrees.
#[derive(Debug, Clone, Default)]
pub struct JointTrack {
    pub joint: String,
    pub translation: Option<Vec<[f32; 3]>>,
    pub rotation: Option<Vec<[f32; 3]>>,
    pub scale: Option<Vec<[f32; 3]>>,
}

/// One animation clip baked to fixed-rate per-joint samples.
#[derive(Debug, Clone, Default)]
pub struct BakedClip {
    pub name: String,
    pub fps: f32,
    pub frames: usize,
    pub tracks: Vec<JointTrack>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_joint_walks_the_hierarchy() {
        let child = Joint::new("hand", Mat4::identity(), Mat4::identity()).into_handle();
        let mut arm = Joint::new("arm", Mat4::identity(), Mat4::identity());
        arm.children.push(Rc::clone(&child));
        let mut skeleton = Skeleton::new("rig");
        skeleton.roots.push(arm.into_handle());

        assert_eq!(skeleton.joint_count(), 2);
        let found = skeleton.find_joint("hand");
        assert!(found.is_some_and(|j| Rc::ptr_eq(&j, &child)));
        assert!(skeleton.find_joint("leg").is_none());
    }

    #[test]
    fn blend_weight_sum() {
        let blend = VertexBlend {
            entries: vec![
                BlendEntry { joint: 0, weight: 0.75 },
                BlendEntry { joint: 2, weight: 0.25 },
            ],
        };
        assert!((blend.total_weight() - 1.0).abs() < 1e-6);
    }
}
