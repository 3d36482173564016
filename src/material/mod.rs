//! Resolved render states.
//!
//! A [`RenderState`] is the engine-side result of resolving one material:
//! legacy fixed-function shading factors plus the texture stages bound for
//! any factor given as a texture reference. States are immutable once
//! built and shared between primitives via `Rc`; re-resolving a material
//! produces a fresh state that replaces the `Rc` on every bound primitive.

use std::rc::Rc;

use crate::texture::Texture2d;

/// One bound texture stage.
#[derive(Debug, Clone)]
pub struct TextureStage {
    /// Stage index (binding order).
    pub stage: usize,
    /// Named UV layer driving this stage; `None` selects the default set.
    pub uv_layer: Option<String>,
    /// The decoded texture.
    pub texture: Rc<Texture2d>,
}

/// Resolved shading attributes for a piece of geometry.
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Material name (the source material id). Empty for the fallback state.
    pub name: String,
    /// Diffuse color factor.
    pub diffuse: [f32; 4],
    /// Specular color factor.
    pub specular: [f32; 4],
    /// Emission color factor.
    pub emission: [f32; 4],
    /// Ambient color factor.
    pub ambient: [f32; 4],
    /// Specular exponent.
    pub shininess: f32,
    /// Bound texture stages, in stage order.
    pub stages: Vec<TextureStage>,
    /// Whether alpha blending is enabled for this state.
    pub transparency: bool,
}

impl RenderState {
    /// The empty/default state bound to primitives whose material is
    /// missing or unresolved.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 1.0],
            ambient: [1.0, 1.0, 1.0, 1.0],
            shininess: 32.0,
            stages: Vec::new(),
            transparency: false,
        }
    }

    /// Whether any texture stage is bound.
    pub fn has_textures(&self) -> bool {
        !self.stages.is_empty()
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_has_no_stages() {
        let state = RenderState::empty();
        assert!(state.name.is_empty());
        assert!(!state.has_textures());
        assert!(!state.transparency);
        assert_eq!(state.diffuse, [0.8, 0.8, 0.8, 1.0]);
    }
}
