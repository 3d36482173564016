use base64::Engine;
use serde_json::{json, Value};

use crate::document::Document;

mod skin_test;

/// Encode raw bytes as an inline data URI the buffer resolver accepts.
fn data_uri(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:application/octet-stream;base64,{encoded}")
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn document(value: Value) -> Document {
    serde_json::from_value(value).unwrap()
}

/// A complete single-triangle document: one scene, one node, one mesh
/// with interleaved position+normal vertices and u16 indices, one red
/// diffuse material. Tests mutate the returned value before parsing.
fn triangle_doc_value() -> Value {
    #[rustfmt::skip]
    let vertices: Vec<f32> = vec![
        0.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,  0.0, 0.0, 1.0,
    ];
    let mut bytes = f32_bytes(&vertices);
    let vertex_len = bytes.len();
    bytes.extend(u16_bytes(&[0, 1, 2]));

    json!({
        "scene": "main",
        "scenes": {"main": {"nodes": ["tri-node"]}},
        "nodes": {"tri-node": {"meshes": ["tri"], "children": []}},
        "meshes": {"tri": {"name": "tri", "primitives": [{
            "attributes": {"POSITION": "acc-pos", "NORMAL": "acc-norm"},
            "indices": "acc-idx",
            "material": "mat"
        }]}},
        "accessors": {
            "acc-pos": {
                "bufferView": "view-vert", "byteOffset": 0, "byteStride": 24,
                "componentType": 5126, "type": "VEC3", "count": 3
            },
            "acc-norm": {
                "bufferView": "view-vert", "byteOffset": 12, "byteStride": 24,
                "componentType": 5126, "type": "VEC3", "count": 3
            },
            "acc-idx": {
                "bufferView": "view-idx",
                "componentType": 5123, "type": "SCALAR", "count": 3
            }
        },
        "bufferViews": {
            "view-vert": {"buffer": "buf", "byteOffset": 0, "byteLength": vertex_len},
            "view-idx": {"buffer": "buf", "byteOffset": vertex_len, "byteLength": 6}
        },
        "buffers": {"buf": {"uri": data_uri(&bytes), "byteLength": bytes.len()}},
        "materials": {"mat": {"values": {
            "diffuse": [1.0, 0.0, 0.0, 1.0],
            "shininess": 16.0
        }}}
    })
}
