//! Typed accessor decoding.
//!
//! Accessors describe how to read one attribute's values out of a buffer
//! view: a GL component-type code, an element arity, a count and an
//! optional interleave stride. Decoders validate that the declared
//! elements fit inside the view before reading anything.

use crate::document::{Accessor, Document, ElementKind};
use crate::math::{mat4_from_column_slice, Mat4};
use crate::mesh::{IndexData, IndexFormat};

use super::buffers::BufferCache;
use super::error::ConvertError;

const COMPONENT_I8: u32 = 5120;
const COMPONENT_U8: u32 = 5121;
const COMPONENT_I16: u32 = 5122;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

fn component_size(component_type: u32) -> Result<usize, ConvertError> {
    match component_type {
        COMPONENT_I8 | COMPONENT_U8 => Ok(1),
        COMPONENT_I16 | COMPONENT_U16 => Ok(2),
        COMPONENT_U32 | COMPONENT_F32 => Ok(4),
        other => Err(ConvertError::Accessor(format!(
            "unknown component type {other}"
        ))),
    }
}

/// Index width implied by an index accessor's component type.
pub fn index_format(accessor: &Accessor) -> Result<IndexFormat, ConvertError> {
    match accessor.component_type {
        COMPONENT_U8 | COMPONENT_U16 => Ok(IndexFormat::Uint16),
        COMPONENT_U32 => Ok(IndexFormat::Uint32),
        other => Err(ConvertError::Accessor(format!(
            "component type {other} is not a valid index type"
        ))),
    }
}

struct View<'a> {
    bytes: &'a [u8],
    stride: usize,
    element_size: usize,
    arity: usize,
    component_type: u32,
    component_size: usize,
    count: usize,
}

fn resolve_view<'a>(
    cache: &'a mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<View<'a>, ConvertError> {
    let accessor = document
        .accessors
        .get(accessor_id)
        .ok_or_else(|| ConvertError::Accessor(format!("unknown accessor '{accessor_id}'")))?;
    let view = document
        .buffer_views
        .get(&accessor.buffer_view)
        .ok_or_else(|| {
            ConvertError::Accessor(format!("unknown buffer view '{}'", accessor.buffer_view))
        })?;

    let component_size = component_size(accessor.component_type)?;
    let arity = accessor.kind.arity();
    let element_size = component_size * arity;
    let stride = accessor.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(ConvertError::Accessor(format!(
            "accessor '{accessor_id}' stride {stride} is smaller than its element size {element_size}"
        )));
    }
    if accessor.byte_offset > view.byte_length {
        return Err(ConvertError::Accessor(format!(
            "accessor '{accessor_id}' starts at byte {} past its view of {} bytes",
            accessor.byte_offset, view.byte_length
        )));
    }
    if accessor.count > 0 {
        let span = accessor.byte_offset + stride * (accessor.count - 1) + element_size;
        if span > view.byte_length {
            return Err(ConvertError::Accessor(format!(
                "accessor '{accessor_id}' needs {span} bytes but its view holds {}",
                view.byte_length
            )));
        }
    }

    let bytes = cache.resolve(document, &view.buffer, view.byte_offset, view.byte_length)?;
    Ok(View {
        bytes: &bytes[accessor.byte_offset..],
        stride,
        element_size,
        arity,
        component_type: accessor.component_type,
        component_size,
        count: accessor.count,
    })
}

fn read_component(component_type: u32, bytes: &[u8]) -> f32 {
    match component_type {
        COMPONENT_I8 => bytes[0] as i8 as f32,
        COMPONENT_U8 => bytes[0] as f32,
        COMPONENT_I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
        COMPONENT_U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f32,
        COMPONENT_U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        _ => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Decode every component of an accessor to f32, in element order.
///
/// Integer components are widened numerically, not normalized; the legacy
/// document subset stores geometric attributes and weights as f32.
pub fn decode_floats(
    cache: &mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<Vec<f32>, ConvertError> {
    let view = resolve_view(cache, document, accessor_id)?;
    let mut out = Vec::with_capacity(view.count * view.arity);
    for element in 0..view.count {
        let base = element * view.stride;
        for component in 0..view.arity {
            let at = base + component * view.component_size;
            out.push(read_component(
                view.component_type,
                &view.bytes[at..at + view.component_size],
            ));
        }
    }
    Ok(out)
}

/// Decode an unsigned integer accessor to u32 components, in element order.
pub fn decode_u32s(
    cache: &mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<Vec<u32>, ConvertError> {
    let view = resolve_view(cache, document, accessor_id)?;
    let mut out = Vec::with_capacity(view.count * view.arity);
    for element in 0..view.count {
        let base = element * view.stride;
        for component in 0..view.arity {
            let at = base + component * view.component_size;
            let value = match view.component_type {
                COMPONENT_U8 => u32::from(view.bytes[at]),
                COMPONENT_U16 => {
                    u32::from(u16::from_le_bytes([view.bytes[at], view.bytes[at + 1]]))
                }
                COMPONENT_U32 => u32::from_le_bytes([
                    view.bytes[at],
                    view.bytes[at + 1],
                    view.bytes[at + 2],
                    view.bytes[at + 3],
                ]),
                other => {
                    return Err(ConvertError::Accessor(format!(
                        "component type {other} is not an unsigned integer"
                    )))
                }
            };
            out.push(value);
        }
    }
    Ok(out)
}

/// Decode an index accessor at the width its component type implies.
pub fn decode_indices(
    cache: &mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<IndexData, ConvertError> {
    let accessor = document
        .accessors
        .get(accessor_id)
        .ok_or_else(|| ConvertError::Accessor(format!("unknown accessor '{accessor_id}'")))?;
    if accessor.kind != ElementKind::Scalar {
        return Err(ConvertError::Accessor(format!(
            "index accessor '{accessor_id}' must be scalar"
        )));
    }
    let format = index_format(accessor)?;
    let values = decode_u32s(cache, document, accessor_id)?;
    Ok(match format {
        IndexFormat::Uint16 => IndexData::U16(values.into_iter().map(|v| v as u16).collect()),
        IndexFormat::Uint32 => IndexData::U32(values),
    })
}

/// Decode a MAT4 accessor into column-major matrices.
pub fn decode_mat4s(
    cache: &mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<Vec<Mat4>, ConvertError> {
    let accessor = document
        .accessors
        .get(accessor_id)
        .ok_or_else(|| ConvertError::Accessor(format!("unknown accessor '{accessor_id}'")))?;
    if accessor.kind != ElementKind::Mat4 {
        return Err(ConvertError::Accessor(format!(
            "accessor '{accessor_id}' is not MAT4"
        )));
    }
    let floats = decode_floats(cache, document, accessor_id)?;
    Ok(floats
        .chunks_exact(16)
        .map(|chunk| {
            let mut columns = [0.0f32; 16];
            columns.copy_from_slice(chunk);
            mat4_from_column_slice(&columns)
        })
        .collect())
}

/// Look up an accessor's declared element count.
pub fn element_count(document: &Document, accessor_id: &str) -> Result<usize, ConvertError> {
    document
        .accessors
        .get(accessor_id)
        .map(|a| a.count)
        .ok_or_else(|| ConvertError::Accessor(format!("unknown accessor '{accessor_id}'")))
}

/// Raw bytes of an accessor's whole buffer view, for bulk vertex copies.
///
/// The layout precondition is that the view holds the complete interleaved
/// vertex array starting at the accessor's element zero.
pub fn view_bytes<'a>(
    cache: &'a mut BufferCache,
    document: &Document,
    accessor_id: &str,
) -> Result<&'a [u8], ConvertError> {
    let accessor = document
        .accessors
        .get(accessor_id)
        .ok_or_else(|| ConvertError::Accessor(format!("unknown accessor '{accessor_id}'")))?;
    let view = document
        .buffer_views
        .get(&accessor.buffer_view)
        .ok_or_else(|| {
            ConvertError::Accessor(format!("unknown buffer view '{}'", accessor.buffer_view))
        })?;
    cache.resolve(document, &view.buffer, view.byte_offset, view.byte_length)
}
