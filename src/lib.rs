//! # gltf2scene
//!
//! Converts parsed glTF interchange documents into an engine-native,
//! renderable scene graph.
//!
//! The entry point is [`convert::Converter`]: feed it full or incremental
//! [`document::Document`] values through [`convert::Converter::update`] and
//! read back assembled scene roots, the active camera selection, and the
//! background color. Retained state is keyed by source id so repeated
//! updates patch existing geometry instead of rebuilding everything.

pub mod convert;
pub mod document;
pub mod material;
pub mod math;
pub mod mesh;
pub mod scene;
pub mod texture;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
