//! Engine-side scene graph.
//!
//! This module provides the retained output representation:
//!
//! - [`SceneNode`] / [`NodeHandle`] - Transform-hierarchy nodes with typed
//!   attachments (mesh, camera, light, skeleton, collision body)
//! - [`Skeleton`] / [`Joint`] - Joint hierarchies with bind poses
//! - [`BlendTable`] - Deduplicated per-vertex joint weights
//! - [`BakedClip`] - Animations sampled to fixed-rate per-joint tracks

mod skeleton;
mod types;

pub use skeleton::{
    BakedClip, BlendEntry, BlendTable, Joint, JointHandle, JointTrack, Skeleton, VertexBlend,
};
pub use types::{
    Attachment, CameraNode, CollisionBody, CollisionShape, LightKind, LightNode, NodeHandle,
    SceneNode,
};
