//! Parsed interchange documents.
//!
//! A [`Document`] is the read-only input of one conversion cycle: top-level
//! collections keyed by string id, describing buffers, accessors, meshes,
//! materials, cameras, lights, skins, animations, and scenes. Incremental
//! documents carry only the collections that changed and are folded into
//! retained state with [`Document::merge`].

mod types;

pub use types::*;

impl Document {
    /// Parse a document from raw JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Parse a document from a JSON string.
    pub fn from_str(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Merge an incremental document into this one.
    ///
    /// Each top-level collection merges shallowly: entries from `delta`
    /// insert or overwrite by id, entries absent from `delta` are kept.
    /// The active-scene selection is replaced only when `delta` carries one.
    pub fn merge(&mut self, delta: Document) {
        if delta.scene.is_some() {
            self.scene = delta.scene;
        }
        self.scenes.extend(delta.scenes);
        self.nodes.extend(delta.nodes);
        self.meshes.extend(delta.meshes);
        self.accessors.extend(delta.accessors);
        self.buffer_views.extend(delta.buffer_views);
        self.buffers.extend(delta.buffers);
        self.materials.extend(delta.materials);
        self.textures.extend(delta.textures);
        self.images.extend(delta.images);
        self.cameras.extend(delta.cameras);
        self.skins.extend(delta.skins);
        self.animations.extend(delta.animations);
        if let Some(common) = delta.extensions.common {
            match &mut self.extensions.common {
                Some(existing) => existing.lights.extend(common.lights),
                None => self.extensions.common = Some(common),
            }
        }
    }

    /// Shared light definitions, if the document carries any.
    pub fn lights(&self) -> Option<&std::collections::HashMap<String, Light>> {
        self.extensions.common.as_ref().map(|ext| &ext.lights)
    }
}
