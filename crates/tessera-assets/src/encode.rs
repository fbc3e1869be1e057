use std::borrow::Cow;

use serde_json::{json, Value};

use crate::error::AssetError;
use crate::scene::{ChunkMesh, ChunkScene};

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const TRIANGLES: u32 = 4;

/// Accumulates the binary chunk and the bufferView/accessor tables.
#[derive(Default)]
struct BinBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinBuilder {
    fn push(&mut self, bytes: &[u8], target: u32, mut accessor: Value) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        // 4-byte alignment keeps every accessor valid for f32/u32 reads.
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }

        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target,
        }));
        accessor["bufferView"] = json!(self.views.len() - 1);
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn push_mesh(&mut self, mesh: &ChunkMesh) -> Value {
        let count = mesh.vertices.len();
        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
        let normals: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.normal).collect();
        let colors: Vec<[f32; 4]> = mesh.vertices.iter().map(|v| v.color).collect();

        let (min, max) = position_range(&positions);
        let position = self.push(
            bytemuck::cast_slice(&positions),
            ARRAY_BUFFER,
            json!({ "componentType": FLOAT, "count": count, "type": "VEC3", "min": min, "max": max }),
        );
        let normal = self.push(
            bytemuck::cast_slice(&normals),
            ARRAY_BUFFER,
            json!({ "componentType": FLOAT, "count": count, "type": "VEC3" }),
        );
        let color = self.push(
            bytemuck::cast_slice(&colors),
            ARRAY_BUFFER,
            json!({ "componentType": FLOAT, "count": count, "type": "VEC4" }),
        );
        let indices = self.push(
            bytemuck::cast_slice(&mesh.indices),
            ELEMENT_ARRAY_BUFFER,
            json!({ "componentType": UNSIGNED_INT, "count": mesh.indices.len(), "type": "SCALAR" }),
        );

        json!({
            "attributes": { "POSITION": position, "NORMAL": normal, "COLOR_0": color },
            "indices": indices,
            "mode": TRIANGLES,
        })
    }
}

fn position_range(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

/// Encode a scene as a self-contained binary glTF (Y-up, one node per mesh).
///
/// Each mesh gets its own material carrying `base_color`; vertex colors are
/// written as COLOR_0.
pub fn encode_chunk(scene: &ChunkScene, generator: &str) -> Result<Vec<u8>, AssetError> {
    if scene.meshes.iter().any(|m| m.vertices.is_empty()) {
        return Err(AssetError::Encode("mesh without vertices".into()));
    }

    let mut builder = BinBuilder::default();
    let mut nodes = Vec::with_capacity(scene.meshes.len());
    let mut meshes = Vec::with_capacity(scene.meshes.len());
    let mut materials = Vec::with_capacity(scene.meshes.len());

    for (i, mesh) in scene.meshes.iter().enumerate() {
        let mut primitive = builder.push_mesh(mesh);
        primitive["material"] = json!(i);
        meshes.push(json!({ "name": mesh.name, "primitives": [primitive] }));
        nodes.push(json!({ "name": mesh.name, "mesh": i }));
        materials.push(json!({
            "name": format!("{}_material", mesh.name),
            "pbrMetallicRoughness": {
                "baseColorFactor": mesh.base_color,
                "metallicFactor": 0.0,
                "roughnessFactor": 0.8,
            },
        }));
    }

    let node_indices: Vec<usize> = (0..nodes.len()).collect();
    let doc = json!({
        "asset": { "version": "2.0", "generator": generator },
        "scene": 0,
        "scenes": [{ "nodes": node_indices }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": materials,
        "buffers": [{ "byteLength": builder.bin.len() }],
        "bufferViews": builder.views,
        "accessors": builder.accessors,
    });

    let json = serde_json::to_vec(&doc).map_err(|e| AssetError::Encode(e.to_string()))?;
    let glb = gltf::binary::Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            // Recomputed by the writer.
            length: 0,
        },
        json: Cow::Owned(json),
        bin: Some(Cow::Owned(builder.bin)),
    };
    glb.to_vec().map_err(|e| AssetError::Encode(e.to_string()))
}
