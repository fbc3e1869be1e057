use glam::{Mat3, Mat4, Vec3};

use crate::error::AssetError;
use crate::scene::{ChunkMesh, ChunkScene, MeshVertex};

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_COLOR: [f32; 4] = [1.0; 4];

/// Decode a binary glTF chunk asset into chunk-local meshes.
///
/// Node transforms are baked into vertex positions and normals, so the
/// result only needs the chunk's world offset to be placed. Only the
/// GLB binary chunk is read; external buffer URIs are rejected.
pub fn decode_chunk(bytes: &[u8]) -> Result<ChunkScene, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| AssetError::Parse(e.to_string()))?;
    let blob = gltf.blob.as_deref();
    let document = &gltf.document;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        visit_node(&node, Mat4::IDENTITY, blob, &mut meshes)?;
    }

    if meshes.is_empty() {
        return Err(AssetError::Empty);
    }
    Ok(ChunkScene { meshes })
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    blob: Option<&[u8]>,
    out: &mut Vec<ChunkMesh>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or_else(|| node.name())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {:?} primitive in mesh {:?}",
                    primitive.mode(),
                    name
                );
                continue;
            }
            out.push(read_primitive(&name, &primitive, world, blob)?);
        }
    }

    for child in node.children() {
        visit_node(&child, world, blob, out)?;
    }
    Ok(())
}

fn read_primitive(
    name: &str,
    primitive: &gltf::Primitive,
    world: Mat4,
    blob: Option<&[u8]>,
) -> Result<ChunkMesh, AssetError> {
    for (_, accessor) in primitive.attributes() {
        check_self_contained(name, &accessor)?;
    }
    if let Some(accessor) = primitive.indices() {
        check_self_contained(name, &accessor)?;
    }

    let reader = primitive.reader(|buffer| match buffer.source() {
        gltf::buffer::Source::Bin => blob,
        gltf::buffer::Source::Uri(_) => None,
    });
    let unreadable = |attribute: &'static str| AssetError::UnreadableAccessor {
        mesh: name.to_owned(),
        attribute,
    };

    let positions: Vec<[f32; 3]> = match reader.read_positions() {
        Some(iter) => iter.collect(),
        None if primitive.get(&gltf::Semantic::Positions).is_some() => {
            return Err(unreadable("POSITION"))
        }
        None => {
            return Err(AssetError::MissingPositions {
                mesh: name.to_owned(),
            })
        }
    };
    let count = positions.len();

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(iter) => iter.collect(),
        None if primitive.get(&gltf::Semantic::Normals).is_some() => {
            return Err(unreadable("NORMAL"))
        }
        None => vec![DEFAULT_NORMAL; count],
    };
    check_len(name, "NORMAL", count, normals.len())?;

    let colors: Vec<[f32; 4]> = match reader.read_colors(0) {
        Some(iter) => iter.into_rgba_f32().collect(),
        None if primitive.get(&gltf::Semantic::Colors(0)).is_some() => {
            return Err(unreadable("COLOR_0"))
        }
        None => vec![DEFAULT_COLOR; count],
    };
    check_len(name, "COLOR_0", count, colors.len())?;

    // Sequential indices only for primitives that declare none.
    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None if primitive.indices().is_some() => return Err(unreadable("indices")),
        None => (0..count as u32).collect(),
    };
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(AssetError::IndexOutOfRange {
            mesh: name.to_owned(),
            index,
            vertex_count: count,
        });
    }

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let vertices = positions
        .iter()
        .zip(&normals)
        .zip(&colors)
        .map(|((p, n), c)| {
            let position = world.transform_point3(Vec3::from(*p));
            let normal = (normal_matrix * Vec3::from(*n)).try_normalize().unwrap_or(Vec3::Y);
            MeshVertex::new(position.to_array(), normal.to_array(), *c)
        })
        .collect();

    let base_color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Ok(ChunkMesh {
        name: name.to_owned(),
        base_color,
        vertices,
        indices,
    })
}

/// Chunk assets must carry all data in the GLB binary chunk.
fn check_self_contained(mesh: &str, accessor: &gltf::Accessor) -> Result<(), AssetError> {
    if let Some(view) = accessor.view() {
        if let gltf::buffer::Source::Uri(uri) = view.buffer().source() {
            return Err(AssetError::ExternalBuffer {
                mesh: mesh.to_owned(),
                uri: uri.to_owned(),
            });
        }
    }
    Ok(())
}

fn check_len(
    mesh: &str,
    attribute: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), AssetError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssetError::AttributeLength {
            mesh: mesh.to_owned(),
            attribute,
            expected,
            actual,
        })
    }
}
