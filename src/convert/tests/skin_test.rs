use serde_json::{json, Value};

use crate::convert::Converter;

use super::{data_uri, document, f32_bytes, u16_bytes};

/// A skinned triangle: two deforming joints ("j-root", "j-tip") with a
/// non-deforming "j-mid" between them, identity bind matrices, and one
/// two-frame rotation clip on the root joint.
fn skinned_doc_value() -> Value {
    #[rustfmt::skip]
    let vertices: Vec<f32> = vec![
        0.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,  0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,  0.0, 0.0, 1.0,
    ];
    let joints: Vec<u8> = vec![
        0, 0, 0, 0,
        0, 1, 0, 0,
        0, 1, 0, 0,
    ];
    #[rustfmt::skip]
    let weights: Vec<f32> = vec![
        1.0, 0.0, 0.0, 0.0,
        0.5, 0.5, 0.0, 0.0,
        0.5, 0.5, 0.0, 0.0,
    ];
    let identity: Vec<f32> = vec![
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let bind_matrices: Vec<f32> = [identity.clone(), identity].concat();
    let times: Vec<f32> = vec![0.0, 1.0];
    // Identity, then a quarter turn around z.
    let rotations: Vec<f32> = vec![
        0.0, 0.0, 0.0, 1.0,
        0.0, 0.0, 0.70710678, 0.70710678,
    ];

    json!({
        "scene": "main",
        "scenes": {"main": {"nodes": ["hero"]}},
        "nodes": {
            "hero": {"meshes": ["skinned"], "skin": "skin0", "children": []},
            "j-root": {"jointName": "root", "children": ["j-mid"]},
            "j-mid": {"children": ["j-tip"]},
            "j-tip": {"jointName": "tip", "children": []}
        },
        "skins": {"skin0": {
            "joints": ["j-root", "j-tip"],
            "inverseBindMatrices": "acc-ibm",
            "skeleton": "j-root"
        }},
        "animations": {"wave": {
            "channels": [
                {"sampler": "s0", "target": {"node": "j-root", "path": "rotation"}}
            ],
            "samplers": {"s0": {"input": "acc-time", "output": "acc-rot"}}
        }},
        "meshes": {"skinned": {"name": "skinned", "primitives": [{
            "attributes": {
                "POSITION": "acc-pos", "NORMAL": "acc-norm",
                "JOINTS_0": "acc-joints", "WEIGHTS_0": "acc-weights"
            },
            "indices": "acc-idx"
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
            "acc-joints": {
                "bufferView": "view-joints",
                "componentType": 5121, "type": "VEC4", "count": 3
            },
            "acc-weights": {
                "bufferView": "view-weights",
                "componentType": 5126, "type": "VEC4", "count": 3
            },
            "acc-ibm": {
                "bufferView": "view-ibm",
                "componentType": 5126, "type": "MAT4", "count": 2
            },
            "acc-time": {
                "bufferView": "view-time",
                "componentType": 5126, "type": "SCALAR", "count": 2
            },
            "acc-rot": {
                "bufferView": "view-rot",
                "componentType": 5126, "type": "VEC4", "count": 2
            },
            "acc-idx": {
                "bufferView": "view-idx",
                "componentType": 5123, "type": "SCALAR", "count": 3
            }
        },
        "bufferViews": {
            "view-vert": {"buffer": "b-vert", "byteOffset": 0, "byteLength": 72},
            "view-joints": {"buffer": "b-joints", "byteOffset": 0, "byteLength": 12},
            "view-weights": {"buffer": "b-weights", "byteOffset": 0, "byteLength": 48},
            "view-ibm": {"buffer": "b-ibm", "byteOffset": 0, "byteLength": 128},
            "view-time": {"buffer": "b-time", "byteOffset": 0, "byteLength": 8},
            "view-rot": {"buffer": "b-rot", "byteOffset": 0, "byteLength": 32},
            "view-idx": {"buffer": "b-idx", "byteOffset": 0, "byteLength": 6}
        },
        "buffers": {
            "b-vert": {"uri": data_uri(&f32_bytes(&vertices)), "byteLength": 72},
            "b-joints": {"uri": data_uri(&joints), "byteLength": 12},
            "b-weights": {"uri": data_uri(&f32_bytes(&weights)), "byteLength": 48},
            "b-ibm": {"uri": data_uri(&f32_bytes(&bind_matrices)), "byteLength": 128},
            "b-time": {"uri": data_uri(&f32_bytes(&times)), "byteLength": 8},
            "b-rot": {"uri": data_uri(&f32_bytes(&rotations)), "byteLength": 32},
            "b-idx": {"uri": data_uri(&u16_bytes(&[0, 1, 2])), "byteLength": 6}
        }
    })
}

#[test]
fn builds_a_skeleton_with_deforming_joints_only() {
    let mut converter = Converter::new();
    converter.update(document(skinned_doc_value())).unwrap();

    let character = converter.character("skin0").expect("character").borrow();
    // j-mid sits in the hierarchy but deforms nothing.
    assert_eq!(character.joint_count(), 3);
    assert_eq!(character.vertex_transforms.len(), 2);
    assert!(character.find_joint("root").is_some());
    assert!(character.find_joint("tip").is_some());
    assert!(character.find_joint("j-mid").is_some());
}

#[test]
fn blend_table_is_interned_and_weights_sum_to_one() {
    let mut converter = Converter::new();
    converter.update(document(skinned_doc_value())).unwrap();

    let mesh = converter.mesh("skinned").unwrap().borrow();
    assert!(mesh.is_animated());
    // Position + normal + blend index.
    assert_eq!(mesh.layout().stride(), 28);
    assert_eq!(mesh.vertex_data().len(), 3 * 28);

    let table = mesh.blend_table().expect("blend table");
    // Vertices 1 and 2 share one blend row.
    assert_eq!(table.len(), 2);
    assert_eq!(mesh.blend_indices(), &[0, 1, 1]);
    for row in &table.rows {
        assert!((row.total_weight() - 1.0).abs() < 1e-6);
    }
    assert_eq!(table.rows[1].entries.len(), 2);
}

#[test]
fn bakes_rotation_tracks_as_euler_degrees() {
    let mut converter = Converter::new();
    converter.update(document(skinned_doc_value())).unwrap();

    let character = converter.character("skin0").unwrap().borrow();
    assert_eq!(character.clips.len(), 1);
    let clip = &character.clips[0];
    assert_eq!(clip.name, "wave");
    assert_eq!(clip.frames, 2);
    assert_eq!(clip.fps, 30.0);

    assert_eq!(clip.tracks.len(), 1);
    let track = &clip.tracks[0];
    assert_eq!(track.joint, "root");
    assert!(track.translation.is_none());
    assert!(track.scale.is_none());
    let rotation = track.rotation.as_ref().expect("rotation track");
    assert_eq!(rotation.len(), 2);
    assert!(rotation[0][2].abs() < 1e-3);
    assert!((rotation[1][2] - 90.0).abs() < 1e-2);
}

#[test]
fn scene_frame_rate_overrides_the_default() {
    let mut value = skinned_doc_value();
    value["scenes"]["main"]["extras"] = json!({"frames_per_second": 24.0});

    let mut converter = Converter::new();
    converter.update(document(value)).unwrap();

    let character = converter.character("skin0").unwrap().borrow();
    assert_eq!(character.clips[0].fps, 24.0);
}

#[test]
fn unknown_skin_degrades_to_an_unskinned_mesh() {
    let mut value = skinned_doc_value();
    value["nodes"]["hero"]["skin"] = "nothere".into();

    let mut converter = Converter::new();
    converter.update(document(value)).unwrap();

    // The weights are dropped but the geometry still builds, without a
    // blend-index column widening the vertex.
    let mesh = converter.mesh("skinned").unwrap().borrow();
    assert!(!mesh.is_animated());
    assert_eq!(mesh.layout().stride(), 24);
    assert_eq!(mesh.vertex_data().len(), 3 * 24);
    assert!(mesh.blend_table().is_none());
    assert!(converter.character("nothere").is_none());
}

#[test]
fn unknown_joint_reference_is_skipped_not_fatal() {
    let mut value = skinned_doc_value();
    // Vertex 0 points at joint slot 3, which maps to no known joint.
    let joints: Vec<u8> = vec![3, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0];
    value["buffers"]["b-joints"]["uri"] = data_uri(&joints).into();

    let mut converter = Converter::new();
    converter.update(document(value)).unwrap();

    let mesh = converter.mesh("skinned").unwrap().borrow();
    let table = mesh.blend_table().unwrap();
    // Vertex 0's only influence was dropped, leaving an empty blend row.
    assert!(table.rows[usize::try_from(mesh.blend_indices()[0]).unwrap()]
        .entries
        .is_empty());
}
