use criterion::{black_box, criterion_group, criterion_main, Criterion};

use base64::Engine;
use serde_json::json;

use gltf2scene::convert::Converter;
use gltf2scene::document::Document;

/// Build a document with one mesh of `quads` quads in a grid, interleaved
/// position+normal vertices and u16 indices.
fn grid_document(quads: usize) -> Document {
    let side = (quads as f32).sqrt().ceil() as usize;
    let mut vertices: Vec<f32> = Vec::new();
    for y in 0..=side {
        for x in 0..=side {
            vertices.extend_from_slice(&[x as f32, y as f32, 0.0, 0.0, 0.0, 1.0]);
        }
    }
    let mut indices: Vec<u16> = Vec::new();
    for y in 0..side {
        for x in 0..side {
            let base = (y * (side + 1) + x) as u16;
            let up = base + side as u16 + 1;
            indices.extend_from_slice(&[base, base + 1, up, base + 1, up + 1, up]);
        }
    }
    let vertex_count = (side + 1) * (side + 1);

    let mut bytes: Vec<u8> = vertices.iter().flat_map(|v| v.to_le_bytes()).collect();
    let vertex_len = bytes.len();
    bytes.extend(indices.iter().flat_map(|v| v.to_le_bytes()));
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );

    let value = json!({
        "scene": "main",
        "scenes": {"main": {"nodes": ["grid-node"]}},
        "nodes": {"grid-node": {"meshes": ["grid"], "children": []}},
        "meshes": {"grid": {"name": "grid", "primitives": [{
            "attributes": {"POSITION": "acc-pos", "NORMAL": "acc-norm"},
            "indices": "acc-idx",
            "material": "mat"
        }]}},
        "accessors": {
            "acc-pos": {
                "bufferView": "view-vert", "byteOffset": 0, "byteStride": 24,
                "componentType": 5126, "type": "VEC3", "count": vertex_count
            },
            "acc-norm": {
                "bufferView": "view-vert", "byteOffset": 12, "byteStride": 24,
                "componentType": 5126, "type": "VEC3", "count": vertex_count
            },
            "acc-idx": {
                "bufferView": "view-idx",
                "componentType": 5123, "type": "SCALAR", "count": indices.len()
            }
        },
        "bufferViews": {
            "view-vert": {"buffer": "buf", "byteOffset": 0, "byteLength": vertex_len},
            "view-idx": {
                "buffer": "buf", "byteOffset": vertex_len,
                "byteLength": indices.len() * 2
            }
        },
        "buffers": {"buf": {"uri": uri, "byteLength": bytes.len()}},
        "materials": {"mat": {"values": {"diffuse": [0.8, 0.2, 0.2, 1.0]}}}
    });
    serde_json::from_value(value).expect("valid document")
}

fn bench_full_update_small(c: &mut Criterion) {
    let document = grid_document(64);
    c.bench_function("update_grid_64_quads", |b| {
        b.iter(|| {
            let mut converter = Converter::new();
            converter.update(black_box(document.clone())).unwrap();
            black_box(converter.active_scene().is_some())
        });
    });
}

fn bench_full_update_large(c: &mut Criterion) {
    let document = grid_document(4096);
    c.bench_function("update_grid_4096_quads", |b| {
        b.iter(|| {
            let mut converter = Converter::new();
            converter.update(black_box(document.clone())).unwrap();
            black_box(converter.active_scene().is_some())
        });
    });
}

fn bench_incremental_material_update(c: &mut Criterion) {
    let document = grid_document(4096);
    let delta = serde_json::from_value::<Document>(json!({
        "materials": {"mat": {"values": {"diffuse": [0.1, 0.9, 0.1, 1.0]}}}
    }))
    .expect("valid delta");

    let mut converter = Converter::new();
    converter.update(document).unwrap();
    c.bench_function("update_material_only", |b| {
        b.iter(|| converter.update(black_box(delta.clone())).unwrap());
    });
}

criterion_group!(
    benches,
    bench_full_update_small,
    bench_full_update_large,
    bench_incremental_material_update
);
criterion_main!(benches);
