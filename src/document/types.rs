//! Interchange document data types.
//!
//! These mirror the JSON shape of the source documents: top-level
//! collections keyed by string id, nodes referencing meshes/cameras/skins
//! by id, and vendor extension blocks modeled as a closed set of typed,
//! optional fields rather than free-form key probing.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::math::{mat4_from_scale_rotation_translation, mat4_from_column_slice, quat_from_array, Mat4, Vec3};

/// A parsed interchange document. May be a full document or an incremental
/// delta; see [`Document::merge`](super::Document::merge).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Id of the active scene, if selected.
    #[serde(default)]
    pub scene: Option<String>,
    #[serde(default)]
    pub scenes: HashMap<String, Scene>,
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub meshes: HashMap<String, Mesh>,
    #[serde(default)]
    pub accessors: HashMap<String, Accessor>,
    #[serde(default)]
    pub buffer_views: HashMap<String, BufferView>,
    #[serde(default)]
    pub buffers: HashMap<String, Buffer>,
    #[serde(default)]
    pub materials: HashMap<String, Material>,
    #[serde(default)]
    pub textures: HashMap<String, Texture>,
    #[serde(default)]
    pub images: HashMap<String, Image>,
    #[serde(default)]
    pub cameras: HashMap<String, Camera>,
    #[serde(default)]
    pub skins: HashMap<String, Skin>,
    #[serde(default)]
    pub animations: HashMap<String, Animation>,
    #[serde(default)]
    pub extensions: DocumentExtensions,
}

/// Document-level extension blocks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentExtensions {
    /// Shared light definitions.
    #[serde(rename = "KHR_materials_common", default)]
    pub common: Option<CommonExtension>,
}

/// The shared-lights extension block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommonExtension {
    #[serde(default)]
    pub lights: HashMap<String, Light>,
}

// -- Buffers and accessors --

/// A raw byte payload: either an inline `data:` URI or an external file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub byte_length: usize,
}

/// A byte-range window into a buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: String,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
}

/// Element arity of an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC2")]
    Vec2,
    #[serde(rename = "VEC3")]
    Vec3,
    #[serde(rename = "VEC4")]
    Vec4,
    #[serde(rename = "MAT4")]
    Mat4,
}

impl ElementKind {
    /// Number of components per element.
    pub fn arity(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat4 => 16,
        }
    }
}

/// A typed, strided view describing how to read one attribute out of a
/// buffer view. `component_type` uses the GL numeric codes (5120–5126).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: String,
    #[serde(default)]
    pub byte_offset: usize,
    #[serde(default)]
    pub byte_stride: Option<usize>,
    pub component_type: u32,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub count: usize,
}

// -- Scene graph --

/// A node in the source scene graph.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    /// Column-major local matrix. Takes precedence over TRS when present.
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub meshes: Vec<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub skin: Option<String>,
    /// Joint identifier when this node participates in a skin's skeleton.
    #[serde(default)]
    pub joint_name: Option<String>,
    #[serde(default)]
    pub extensions: NodeExtensions,
}

impl Node {
    /// The node's local transform as a matrix.
    pub fn local_matrix(&self) -> Mat4 {
        if let Some(values) = &self.matrix {
            return mat4_from_column_slice(values);
        }
        let translation = self.translation.unwrap_or([0.0, 0.0, 0.0]);
        let rotation = self.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let scale = self.scale.unwrap_or([1.0, 1.0, 1.0]);
        mat4_from_scale_rotation_translation(
            Vec3::from(scale),
            quat_from_array(rotation),
            Vec3::from(translation),
        )
    }

    /// Scale components of the local transform, for mirroring detection.
    pub fn local_scale(&self) -> [f32; 3] {
        if let Some(scale) = self.scale {
            return scale;
        }
        if self.matrix.is_some() {
            let m = self.local_matrix();
            let (s, _, _) = crate::math::to_scale_rotation_translation(&m);
            // Determinant sign folds all mirroring into one component.
            if crate::math::mat4_mirrors(&m) {
                return [-s.x, s.y, s.z];
            }
            return [s.x, s.y, s.z];
        }
        [1.0, 1.0, 1.0]
    }
}

/// Node-level extension blocks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeExtensions {
    /// Physics body description.
    #[serde(rename = "BLENDER_physics", default)]
    pub physics: Option<RigidBody>,
    /// Reference to a shared light definition.
    #[serde(rename = "KHR_materials_common", default)]
    pub light: Option<LightRef>,
}

/// Node-side reference into the document's shared lights.
#[derive(Debug, Clone, Deserialize)]
pub struct LightRef {
    pub light: String,
}

/// Physics body attached to a node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigidBody {
    #[serde(default)]
    pub collision_shapes: Vec<CollisionShapeDef>,
    #[serde(default = "RigidBody::default_mass")]
    pub mass: f32,
    /// Static bodies never move; everything else is dynamic.
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

impl RigidBody {
    fn default_mass() -> f32 {
        1.0
    }
}

/// One collision shape of a physics body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionShapeDef {
    pub shape_type: CollisionShapeType,
    /// Local extents (width, height, depth) the shape is fitted to.
    #[serde(default = "CollisionShapeDef::default_bounds")]
    pub bounding_box: [f32; 3],
    /// Mesh id for hull/mesh shapes.
    #[serde(default)]
    pub mesh: Option<String>,
}

impl CollisionShapeDef {
    fn default_bounds() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }
}

/// Collision shape type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollisionShapeType {
    Box,
    Sphere,
    Capsule,
    Cylinder,
    Cone,
    ConvexHull,
    Mesh,
    #[serde(other)]
    Unknown,
}

/// A scene: a list of root node ids plus presentation extras.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub extras: SceneExtras,
}

/// Presentation extras carried on a scene by the exporting application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneExtras {
    #[serde(default)]
    pub background_color: Option<[f32; 3]>,
    #[serde(default)]
    pub active_camera: Option<String>,
    #[serde(default)]
    pub hidden_nodes: Vec<String>,
    #[serde(default)]
    pub frames_per_second: Option<f32>,
}

// -- Meshes --

/// A mesh: a named list of primitives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

/// One drawable primitive: attribute-name → accessor id, plus an index
/// accessor and a material binding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Primitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub indices: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
}

// -- Materials and textures --

/// A material carrying the legacy shading value block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: LegacyValues,
}

/// Legacy fixed-function shading values. Each color slot is either a
/// constant factor or a texture reference.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyValues {
    #[serde(default = "LegacyValues::default_diffuse")]
    pub diffuse: ColorOrTexture,
    #[serde(default = "LegacyValues::default_dark")]
    pub specular: ColorOrTexture,
    #[serde(default = "LegacyValues::default_dark")]
    pub emission: ColorOrTexture,
    #[serde(default = "LegacyValues::default_ambient")]
    pub ambient: [f32; 4],
    #[serde(default = "LegacyValues::default_shininess")]
    pub shininess: f32,
}

impl LegacyValues {
    fn default_diffuse() -> ColorOrTexture {
        ColorOrTexture::Color([0.8, 0.8, 0.8, 1.0])
    }

    fn default_dark() -> ColorOrTexture {
        ColorOrTexture::Color([0.0, 0.0, 0.0, 1.0])
    }

    fn default_ambient() -> [f32; 4] {
        [1.0, 1.0, 1.0, 1.0]
    }

    fn default_shininess() -> f32 {
        32.0
    }
}

impl Default for LegacyValues {
    fn default() -> Self {
        Self {
            diffuse: Self::default_diffuse(),
            specular: Self::default_dark(),
            emission: Self::default_dark(),
            ambient: Self::default_ambient(),
            shininess: Self::default_shininess(),
        }
    }
}

/// A shading factor given either as a constant color or as a texture
/// reference bound to a texture stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorOrTexture {
    Color([f32; 4]),
    Texture(TextureSlot),
}

/// Texture reference inside a material value block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureSlot {
    pub texture: String,
    /// Named UV layer for this stage; `None` selects the default set.
    #[serde(default)]
    pub uv_layer: Option<String>,
}

/// Color interpretation hint on a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormatHint {
    Srgb,
    #[default]
    #[serde(other)]
    Linear,
}

/// A texture: an image source plus an optional color-space hint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Texture {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub format: Option<TextureFormatHint>,
}

/// An image payload: external/inline URI or a buffer-view range.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub buffer_view: Option<String>,
}

// -- Cameras and lights --

/// Camera type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    Perspective,
    #[serde(other)]
    Unknown,
}

/// A camera definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Camera {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    #[serde(default)]
    pub perspective: Option<PerspectiveParams>,
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveParams {
    pub yfov: f32,
    #[serde(default = "PerspectiveParams::default_aspect")]
    pub aspect_ratio: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl PerspectiveParams {
    fn default_aspect() -> f32 {
        16.0 / 9.0
    }
}

/// Light type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKindTag {
    Point,
    Directional,
    Spot,
    #[serde(other)]
    Unknown,
}

/// A light definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
    #[serde(rename = "type")]
    pub kind: LightKindTag,
    #[serde(default = "Light::default_color")]
    pub color: [f32; 3],
    #[serde(default = "Light::default_constant")]
    pub constant_attenuation: f32,
    #[serde(default)]
    pub linear_attenuation: f32,
    #[serde(default)]
    pub quadratic_attenuation: f32,
    /// Spot cone half-angle in degrees.
    #[serde(default = "Light::default_falloff")]
    pub fall_off_angle: f32,
    #[serde(default)]
    pub fall_off_exponent: f32,
}

impl Light {
    fn default_color() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }

    fn default_constant() -> f32 {
        1.0
    }

    fn default_falloff() -> f32 {
        45.0
    }
}

// -- Skins and animations --

/// A skin: the joint node ids and their absolute inverse bind matrices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub joints: Vec<String>,
    /// Accessor holding one MAT4 per joint.
    #[serde(default)]
    pub inverse_bind_matrices: Option<String>,
    /// Explicit skeleton root node id, if the exporter recorded one.
    #[serde(default)]
    pub skeleton: Option<String>,
}

/// Animated node property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
    #[serde(other)]
    Unknown,
}

/// Channel target: which node and which property.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationTarget {
    pub node: String,
    pub path: AnimationPath,
}

/// One animation channel: a sampler id plus its target.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationChannel {
    pub sampler: String,
    pub target: AnimationTarget,
}

/// Time/value accessor pair for a channel.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationSampler {
    pub input: String,
    pub output: String,
}

/// A named animation clip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Animation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<AnimationChannel>,
    #[serde(default)]
    pub samplers: HashMap<String, AnimationSampler>,
}
