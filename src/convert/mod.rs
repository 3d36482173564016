//! Document-to-scene conversion.
//!
//! [`Converter`] is the single entry point: feed it parsed interchange
//! documents through [`Converter::update`] and read the assembled scene
//! graphs back out. State is retained across updates and keyed by source
//! id, so incremental documents patch what changed instead of rebuilding
//! everything:
//!
//! - Editing a material re-resolves its render state and swaps it onto
//!   every primitive currently bound to it, without touching geometry
//! - Re-sent meshes, cameras and lights are rebuilt in place under their
//!   existing handles
//! - Scene graphs are re-assembled from the retained per-id objects each
//!   update
//!
//! Decode failures (bad byte ranges, type mismatches) abort the update;
//! dangling references and unsupported feature variants are logged and
//! substituted with defaults.

mod accessor;
mod animation;
mod assemble;
mod buffers;
mod error;
mod material;
mod mesh;
mod skin;

#[cfg(test)]
mod tests;

pub use accessor::{decode_floats, decode_indices, decode_mat4s, decode_u32s, index_format};
pub use buffers::BufferCache;
pub use error::ConvertError;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use log::warn;

use crate::document::{CameraKind, Document, LightKindTag};
use crate::material::RenderState;
use crate::mesh::GeomMesh;
use crate::scene::{CameraNode, LightKind, LightNode, NodeHandle, SceneNode, Skeleton};
use crate::texture::Texture2d;

/// What the downstream scene writer can represent. Probed once by the
/// collaborator that owns serialization and passed in; queried once per
/// update.
#[derive(Debug, Clone, Copy)]
pub struct SerializerCapabilities {
    /// Whether one light may be referenced from several scene nodes. When
    /// false, lights are deep-copied into each referencing node.
    pub instanced_lights: bool,
}

impl Default for SerializerCapabilities {
    fn default() -> Self {
        Self {
            instanced_lights: false,
        }
    }
}

/// Default playback rate for baked animations when the scene declares
/// none.
const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Retained converter state.
///
/// Owns every engine-side object it has built, keyed by source id. Single
/// threaded; one `update` fully resolves before the next begins.
pub struct Converter {
    document: Document,
    buffers: BufferCache,
    capabilities: SerializerCapabilities,
    frame_rate: f32,

    cameras: HashMap<String, Rc<RefCell<CameraNode>>>,
    lights: HashMap<String, Rc<RefCell<LightNode>>>,
    textures: HashMap<String, Rc<Texture2d>>,
    mat_states: HashMap<String, Rc<RenderState>>,
    /// Material id → (mesh id, primitive index) pairs currently bound to
    /// it. A weak back-reference index; stale pairs are pruned lazily
    /// before each patch pass.
    mat_mesh_map: HashMap<String, Vec<(String, usize)>>,
    meshes: HashMap<String, Rc<RefCell<GeomMesh>>>,
    characters: HashMap<String, Rc<RefCell<Skeleton>>>,
    nodes: HashMap<String, NodeHandle>,
    /// Node id → the handle actually inserted into a scene during the
    /// last assembly, for applying visibility overrides without
    /// re-walking the graph.
    node_paths: HashMap<String, NodeHandle>,
    scenes: HashMap<String, NodeHandle>,

    active_scene: Option<String>,
    active_camera: Option<String>,
    background_color: [f32; 3],
}

impl Converter {
    /// Create a converter with default capabilities and no base directory
    /// for external files.
    pub fn new() -> Self {
        Self::with_capabilities(None, SerializerCapabilities::default())
    }

    /// Create a converter. `base_dir` anchors relative buffer and image
    /// URIs; `capabilities` describes the downstream scene writer.
    pub fn with_capabilities(
        base_dir: Option<PathBuf>,
        capabilities: SerializerCapabilities,
    ) -> Self {
        Self {
            document: Document::default(),
            buffers: BufferCache::new(base_dir),
            capabilities,
            frame_rate: DEFAULT_FRAME_RATE,
            cameras: HashMap::new(),
            lights: HashMap::new(),
            textures: HashMap::new(),
            mat_states: HashMap::new(),
            mat_mesh_map: HashMap::new(),
            meshes: HashMap::new(),
            characters: HashMap::new(),
            nodes: HashMap::new(),
            node_paths: HashMap::new(),
            scenes: HashMap::new(),
            active_scene: None,
            active_camera: None,
            background_color: [0.0, 0.0, 0.0],
        }
    }

    /// Ingest a full or incremental document and rebuild what it carries.
    ///
    /// Top-level collections merge shallowly into the retained document;
    /// only the entities present in the incoming delta are then (re)built,
    /// resolving references against the merged state: cameras, lights,
    /// textures, materials (patching bound primitives in place), meshes
    /// (building skeletons and baking animations as a side effect), bare
    /// node transforms, and the delta's scene graphs. The active scene,
    /// camera and background selection is refreshed every call.
    pub fn update(&mut self, delta: Document) -> Result<(), ConvertError> {
        self.buffers.clear();

        let cameras = sorted_keys(delta.cameras.keys());
        let lights = sorted_keys(delta.lights().into_iter().flat_map(|m| m.keys()));
        let textures = sorted_keys(delta.textures.keys());
        let materials = sorted_keys(delta.materials.keys());
        let meshes = sorted_keys(delta.meshes.keys());
        let nodes = sorted_keys(delta.nodes.keys());
        let scenes = sorted_keys(delta.scenes.keys());

        self.document.merge(delta);
        self.frame_rate = self.scene_frame_rate();

        for id in &cameras {
            self.load_camera(id);
        }
        for id in &lights {
            self.load_light(id);
        }
        for id in &textures {
            self.load_texture(id)?;
        }
        for id in &materials {
            self.load_material(id);
        }
        for id in &meshes {
            self.load_mesh(id)?;
        }
        for id in &nodes {
            self.load_node(id);
        }

        for id in scenes {
            let root = self.assemble_scene(&id);
            self.scenes.insert(id, root);
        }
        self.select_active_scene();
        Ok(())
    }

    /// The assembled root of the active scene, if one is selected.
    pub fn active_scene(&self) -> Option<&NodeHandle> {
        self.active_scene.as_deref().and_then(|id| self.scenes.get(id))
    }

    /// The assembled root of a named scene.
    pub fn scene(&self, id: &str) -> Option<&NodeHandle> {
        self.scenes.get(id)
    }

    /// Id of the camera the active scene selects, if any.
    pub fn active_camera(&self) -> Option<&str> {
        self.active_camera.as_deref()
    }

    /// Background color of the active scene.
    pub fn background_color(&self) -> [f32; 3] {
        self.background_color
    }

    /// A built mesh by id, for debugging and tests.
    pub fn mesh(&self, id: &str) -> Option<&Rc<RefCell<GeomMesh>>> {
        self.meshes.get(id)
    }

    /// A resolved render state by material id, for debugging and tests.
    pub fn render_state(&self, id: &str) -> Option<&Rc<RenderState>> {
        self.mat_states.get(id)
    }

    /// A built skeleton by skin id, for debugging and tests.
    pub fn character(&self, id: &str) -> Option<&Rc<RefCell<Skeleton>>> {
        self.characters.get(id)
    }

    fn scene_frame_rate(&self) -> f32 {
        self.document
            .scene
            .as_deref()
            .and_then(|id| self.document.scenes.get(id))
            .and_then(|scene| scene.extras.frames_per_second)
            .unwrap_or(DEFAULT_FRAME_RATE)
    }

    fn load_camera(&mut self, camera_id: &str) {
        let Some(def) = self.document.cameras.get(camera_id) else {
            return;
        };
        let params = match (def.kind, &def.perspective) {
            (CameraKind::Perspective, Some(p)) => p.clone(),
            _ => {
                warn!("camera '{camera_id}' is not a perspective camera, skipping");
                return;
            }
        };
        let fov_y = params.yfov.to_degrees();
        let fov_x = (params.yfov * params.aspect_ratio).to_degrees();
        let camera = CameraNode {
            name: camera_id.to_string(),
            fov_x,
            fov_y,
            near: params.znear,
            far: params.zfar,
        };
        match self.cameras.get(camera_id) {
            Some(existing) => *existing.borrow_mut() = camera,
            None => {
                self.cameras
                    .insert(camera_id.to_string(), Rc::new(RefCell::new(camera)));
            }
        }
    }

    fn load_light(&mut self, light_id: &str) {
        let Some(def) = self.document.lights().and_then(|m| m.get(light_id)).cloned() else {
            return;
        };
        let kind = match def.kind {
            LightKindTag::Point => LightKind::Point,
            LightKindTag::Directional => LightKind::Directional,
            LightKindTag::Spot => LightKind::Spot {
                fall_off_angle: def.fall_off_angle,
                fall_off_exponent: def.fall_off_exponent,
            },
            LightKindTag::Unknown => {
                warn!("light '{light_id}' has an unsupported type, using a placeholder");
                LightKind::Placeholder
            }
        };
        let light = LightNode {
            name: light_id.to_string(),
            kind,
            color: def.color,
            attenuation: [
                def.constant_attenuation,
                def.linear_attenuation,
                def.quadratic_attenuation,
            ],
        };
        match self.lights.get(light_id) {
            Some(existing) => *existing.borrow_mut() = light,
            None => {
                self.lights
                    .insert(light_id.to_string(), Rc::new(RefCell::new(light)));
            }
        }
    }

    /// Refresh a bare node's local transform under its retained handle.
    fn load_node(&mut self, node_id: &str) {
        let Some(def) = self.document.nodes.get(node_id) else {
            return;
        };
        let transform = def.local_matrix();
        let name = def.name.clone().unwrap_or_else(|| node_id.to_string());
        match self.nodes.get(node_id) {
            Some(existing) => {
                let mut node = existing.borrow_mut();
                node.name = name;
                node.transform = transform;
            }
            None => {
                let mut node = SceneNode::new(name);
                node.transform = transform;
                self.nodes.insert(node_id.to_string(), node.into_handle());
            }
        }
    }

    fn select_active_scene(&mut self) {
        let Some(scene_id) = self.document.scene.clone() else {
            return;
        };
        if !self.scenes.contains_key(&scene_id) {
            warn!("active scene '{scene_id}' does not exist");
            return;
        }
        if let Some(scene) = self.document.scenes.get(&scene_id) {
            if let Some(color) = scene.extras.background_color {
                self.background_color = color;
            }
            if let Some(camera) = &scene.extras.active_camera {
                self.active_camera = Some(camera.clone());
            }
        }
        self.active_scene = Some(scene_id);
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort one collection's ids for a deterministic build order.
fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.cloned().collect();
    keys.sort();
    keys
}
