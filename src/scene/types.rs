//! Engine-side scene graph node types.

use std::cell::RefCell;
use std::rc::Rc;

use crate::math::Mat4;
use crate::mesh::GeomMesh;

use super::skeleton::Skeleton;

/// Shared handle to a scene node.
pub type NodeHandle = Rc<RefCell<SceneNode>>;

/// What a scene node carries besides its transform.
#[derive(Debug, Clone, Default)]
pub enum Attachment {
    /// Plain grouping node.
    #[default]
    None,
    /// Built mesh geometry, shared with the converter's mesh map.
    Mesh(Rc<RefCell<GeomMesh>>),
    /// A camera, shared with the converter's camera map.
    Camera(Rc<RefCell<CameraNode>>),
    /// A light. Shared with the converter's light map, or a deep copy
    /// when the serialization target cannot represent instanced lights.
    Light(Rc<RefCell<LightNode>>),
    /// A skinned character: skeleton plus its meshes as children.
    Skeleton(Rc<RefCell<Skeleton>>),
    /// A physics collision body.
    Collision(CollisionBody),
}

/// One node of an assembled scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Mat4,
    pub visible: bool,
    /// Set on wrapper nodes that compensate a mirroring transform by
    /// flipping the winding used for backface culling.
    pub reverse_culling: bool,
    pub attachment: Attachment,
    pub children: Vec<NodeHandle>,
}

impl SceneNode {
    /// Create a bare visible node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::identity(),
            visible: true,
            reverse_culling: false,
            attachment: Attachment::None,
            children: Vec::new(),
        }
    }

    /// Wrap a node in a shared handle.
    pub fn into_handle(self) -> NodeHandle {
        Rc::new(RefCell::new(self))
    }

    /// Whether this node or any descendant carries mesh geometry.
    pub fn subtree_has_mesh(&self) -> bool {
        matches!(self.attachment, Attachment::Mesh(_))
            || self
                .children
                .iter()
                .any(|child| child.borrow().subtree_has_mesh())
    }
}

/// A camera attachment. Fields of view are in degrees.
#[derive(Debug, Clone)]
pub struct CameraNode {
    pub name: String,
    pub fov_x: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

/// A light attachment.
#[derive(Debug, Clone)]
pub struct LightNode {
    pub name: String,
    pub kind: LightKind,
    pub color: [f32; 3],
    /// Constant, linear, quadratic attenuation.
    pub attenuation: [f32; 3],
}

/// Light shape.
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Point,
    Directional,
    Spot {
        /// Cone half-angle in degrees.
        fall_off_angle: f32,
        fall_off_exponent: f32,
    },
    /// Stands in for a light type the engine does not support, so the
    /// node keeps its place in the graph.
    Placeholder,
}

/// A physics collision body attachment.
#[derive(Debug, Clone)]
pub struct CollisionBody {
    pub name: String,
    pub shapes: Vec<CollisionShape>,
    pub mass: f32,
    /// Static bodies never move.
    pub is_static: bool,
}

/// One collision shape, fitted from the source bounding extents.
#[derive(Debug, Clone)]
pub enum CollisionShape {
    Box { half_extents: [f32; 3] },
    Sphere { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Cylinder { radius: f32, height: f32 },
    Cone { radius: f32, height: f32 },
    ConvexHull { mesh: Rc<RefCell<GeomMesh>> },
    TriangleMesh { mesh: Rc<RefCell<GeomMesh>> },
}
