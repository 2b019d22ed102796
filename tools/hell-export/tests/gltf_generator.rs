//! Programmatic glTF generation for integration tests.
//!
//! Writes `scene.gltf` + `scene.bin` with:
//! - "Body": a 1x1 quad on the XZ plane at (0, 1, 0), skinned to "Skeleton"
//! - "Prop": the same quad, child of Body, offset by (2, 0, 0)
//! - "Rig" (empty node) at (0, 0, 5) holding the joints Root -> Tip,
//!   each one unit up the Y axis. Only Tip carries vertex weights.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::json;

pub const GLTF_NAME: &str = "scene.gltf";
const BIN_NAME: &str = "scene.bin";

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, -1.0],
    [0.0, 0.0, -1.0],
];
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

fn push_f32s(buf: &mut Vec<u8>, values: impl IntoIterator<Item = f32>) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Binary payload and the (offset, length) of each buffer view
fn build_buffer() -> (Vec<u8>, Vec<(usize, usize)>) {
    let mut buf = Vec::new();
    let mut views = Vec::new();
    let mut view = |buf: &mut Vec<u8>, start: usize| views.push((start, buf.len() - start));

    let start = buf.len();
    push_f32s(&mut buf, QUAD_POSITIONS.iter().flatten().copied());
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, (0..4).flat_map(|_| [0.0, 1.0, 0.0]));
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, QUAD_UVS.iter().flatten().copied());
    view(&mut buf, start);

    // JOINTS_0: every vertex bound to joint 1 (Tip)
    let start = buf.len();
    for _ in 0..4 {
        buf.extend_from_slice(&[1u8, 0, 0, 0]);
    }
    view(&mut buf, start);

    let start = buf.len();
    push_f32s(&mut buf, (0..4).flat_map(|_| [1.0, 0.0, 0.0, 0.0]));
    view(&mut buf, start);

    let start = buf.len();
    for i in QUAD_INDICES {
        buf.extend_from_slice(&i.to_le_bytes());
    }
    view(&mut buf, start);

    (buf, views)
}

/// Write the test scene into `dir`, returning the .gltf path
pub fn write_test_scene(dir: &Path) -> PathBuf {
    let (bin, views) = build_buffer();
    std::fs::write(dir.join(BIN_NAME), &bin).expect("Failed to write .bin");

    let buffer_views: Vec<_> = views
        .iter()
        .enumerate()
        .map(|(i, &(offset, length))| {
            let target = if i == 5 { 34963 } else { 34962 };
            json!({
                "buffer": 0,
                "byteOffset": offset,
                "byteLength": length,
                "target": target
            })
        })
        .collect();

    let root = json!({
        "asset": { "version": "2.0", "generator": "hell-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0, "translation": [0.0, 1.0, 0.0], "children": [1] },
            { "name": "Prop", "mesh": 0, "translation": [2.0, 0.0, 0.0] },
            { "name": "Rig", "translation": [0.0, 0.0, 5.0], "children": [3] },
            { "name": "Root", "translation": [0.0, 1.0, 0.0], "children": [4] },
            { "name": "Tip", "translation": [0.0, 1.0, 0.0] }
        ],
        "skins": [{ "name": "Skeleton", "joints": [3, 4] }],
        "meshes": [{
            "name": "Quad",
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1,
                    "TEXCOORD_0": 2,
                    "JOINTS_0": 3,
                    "WEIGHTS_0": 4
                },
                "indices": 5,
                "mode": 4
            }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, -1.0], "max": [1.0, 0.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC2" },
            { "bufferView": 3, "componentType": 5121, "count": 4, "type": "VEC4" },
            { "bufferView": 4, "componentType": 5126, "count": 4, "type": "VEC4" },
            { "bufferView": 5, "componentType": 5123, "count": 6, "type": "SCALAR" }
        ],
        "bufferViews": buffer_views,
        "buffers": [{ "uri": BIN_NAME, "byteLength": bin.len() }]
    });

    let path = dir.join(GLTF_NAME);
    let text = serde_json::to_string_pretty(&root).expect("Failed to serialize glTF");
    std::fs::write(&path, text).expect("Failed to write .gltf");
    path
}
