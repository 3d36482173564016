//! Texture decoding and material resolution.

use std::rc::Rc;

use base64::Engine;
use log::warn;

use crate::document::{ColorOrTexture, TextureFormatHint, TextureSlot};
use crate::material::{RenderState, TextureStage};
use crate::texture::Texture2d;

use super::error::ConvertError;
use super::Converter;

impl Converter {
    /// Decode a texture's image and cache it by id.
    ///
    /// A texture without a usable source is skipped with a warning; only
    /// buffer-range failures while fetching buffer-view image bytes are
    /// fatal.
    pub(super) fn load_texture(&mut self, texture_id: &str) -> Result<(), ConvertError> {
        let Some(def) = self.document.textures.get(texture_id).cloned() else {
            return Ok(());
        };
        let Some(image_id) = def.source.as_deref() else {
            warn!("texture '{texture_id}' has no source image, skipping");
            return Ok(());
        };
        let Some(image_def) = self.document.images.get(image_id).cloned() else {
            warn!("texture '{texture_id}' references unknown image '{image_id}', skipping");
            return Ok(());
        };

        let bytes: Vec<u8> = if let Some(view_id) = &image_def.buffer_view {
            let Some(view) = self.document.buffer_views.get(view_id).cloned() else {
                warn!("image '{image_id}' references unknown buffer view '{view_id}', skipping");
                return Ok(());
            };
            self.buffers
                .resolve(&self.document, &view.buffer, view.byte_offset, view.byte_length)?
                .to_vec()
        } else if let Some(uri) = &image_def.uri {
            if let Some(encoded) = uri.strip_prefix("data:") {
                let Some((_, payload)) = encoded.split_once(',') else {
                    warn!("image '{image_id}' has a malformed data uri, skipping");
                    return Ok(());
                };
                match base64::engine::general_purpose::STANDARD.decode(payload) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("image '{image_id}' base64 decode failed: {e}, skipping");
                        return Ok(());
                    }
                }
            } else {
                let path = match self.buffers.base_dir() {
                    Some(dir) => dir.join(uri),
                    None => std::path::PathBuf::from(uri),
                };
                match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("image '{image_id}' could not be read from {path:?}: {e}, skipping");
                        return Ok(());
                    }
                }
            }
        } else {
            warn!("image '{image_id}' has neither uri nor buffer view, skipping");
            return Ok(());
        };

        let decoded = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!("image '{image_id}' failed to decode: {e}, skipping");
                return Ok(());
            }
        };
        let has_alpha = decoded.color().has_alpha();
        let srgb = matches!(def.format, Some(TextureFormatHint::Srgb));
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let texture = Texture2d::new(texture_id, width, height, rgba.into_raw())
            .with_srgb(srgb)
            .with_alpha(has_alpha);
        self.textures.insert(texture_id.to_string(), Rc::new(texture));
        Ok(())
    }

    /// Resolve a material into a render state and patch every primitive
    /// currently bound to it.
    pub(super) fn load_material(&mut self, material_id: &str) {
        let Some(def) = self.document.materials.get(material_id).cloned() else {
            return;
        };
        self.mat_mesh_map.entry(material_id.to_string()).or_default();

        let mut state = RenderState {
            name: material_id.to_string(),
            ambient: def.values.ambient,
            shininess: def.values.shininess,
            ..RenderState::empty()
        };

        // Slots bind texture stages in a fixed order: diffuse, specular,
        // emission.
        let slots = [
            (&def.values.diffuse, &mut state.diffuse),
            (&def.values.specular, &mut state.specular),
            (&def.values.emission, &mut state.emission),
        ];
        let mut stages = Vec::new();
        for (value, factor) in slots {
            match value {
                ColorOrTexture::Color(color) => *factor = *color,
                ColorOrTexture::Texture(slot) => {
                    *factor = [1.0, 1.0, 1.0, 1.0];
                    if let Some(stage) = self.bind_stage(material_id, slot, stages.len()) {
                        stages.push(stage);
                    }
                }
            }
        }
        state.transparency = stages
            .iter()
            .any(|stage: &TextureStage| stage.texture.has_alpha);
        state.stages = stages;
        let state = Rc::new(state);

        // Prune pairs whose mesh has gone away, then swap the new state
        // onto everything still bound.
        let meshes = &self.meshes;
        let pairs = self.mat_mesh_map.entry(material_id.to_string()).or_default();
        pairs.retain(|(mesh_id, _)| meshes.contains_key(mesh_id));
        for (mesh_id, primitive) in pairs.iter() {
            let patched = meshes[mesh_id]
                .borrow_mut()
                .set_primitive_state(*primitive, Rc::clone(&state));
            if !patched {
                warn!(
                    "material '{material_id}' is mapped to missing primitive {primitive} of mesh '{mesh_id}'"
                );
            }
        }

        self.mat_states.insert(material_id.to_string(), state);
    }

    fn bind_stage(
        &self,
        material_id: &str,
        slot: &TextureSlot,
        stage: usize,
    ) -> Option<TextureStage> {
        match self.textures.get(&slot.texture) {
            Some(texture) => Some(TextureStage {
                stage,
                uv_layer: slot.uv_layer.clone(),
                texture: Rc::clone(texture),
            }),
            None => {
                warn!(
                    "material '{material_id}' references unknown texture '{}', stage skipped",
                    slot.texture
                );
                None
            }
        }
    }
}
