//! Engine-side mesh types.
//!
//! This module provides the geometry representation the converter emits:
//!
//! - [`VertexLayout`] - Ordered typed columns of an interleaved vertex array
//! - [`GeomMesh`] - Built geometry: vertex bytes plus indexed primitives
//! - [`GeomPrimitive`] / [`IndexData`] - One indexed triangle list with its
//!   bound render state

mod data;
mod layout;

pub use data::{GeomMesh, GeomPrimitive, IndexData, IndexFormat};
pub use layout::{ColumnSemantic, VertexColumn, VertexLayout};
