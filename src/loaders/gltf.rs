use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use super::asset_loader::AssetSource;
use crate::animation::{AnimationClip, Channel, Interpolation, Keyframes};
use crate::asset::{AssetHandle, MeshPrimitive, Node, ObjectGraph, Skin, Transform};
use crate::error::LoadError;

/// Reads `.gltf` / `.glb` files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSource;

impl AssetSource for GltfSource {
    fn fetch(&self, name: &str, path: &Path) -> Result<AssetHandle, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;
        decode(name, &bytes, path.parent(), &path.display().to_string())
    }
}

/// Decode a self-contained glTF document (GLB or embedded buffers)
pub fn load_gltf_slice(name: &str, bytes: &[u8]) -> Result<AssetHandle, LoadError> {
    decode(name, bytes, None, name)
}

fn decode(
    name: &str,
    bytes: &[u8],
    base: Option<&Path>,
    origin: &str,
) -> Result<AssetHandle, LoadError> {
    let parse_err = |e: gltf::Error| LoadError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(parse_err)?;
    let buffers = gltf::import_buffers(&document, base, blob).map_err(parse_err)?;

    let handle = asset_from_gltf(name, &document, &buffers)?;
    log::debug!(
        "Decoded {}: {} nodes, {} primitives, {} skins, {} clips",
        origin,
        handle.graph().nodes().len(),
        handle.graph().meshes().len(),
        handle.graph().skins().len(),
        handle.clips().len()
    );
    Ok(handle)
}

/// Extract the node hierarchy, geometry, skins and clips of a document
pub fn asset_from_gltf(
    name: &str,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<AssetHandle, LoadError> {
    let nodes = read_nodes(document);
    let mut meshes = Vec::new();
    for node in document.nodes() {
        if let Some(mesh) = node.mesh() {
            read_mesh(name, &node, &mesh, buffers, &mut meshes)?;
        }
    }

    if meshes.is_empty() {
        return Err(LoadError::MissingGeometry(name.to_string()));
    }

    let skins = document.skins().map(|s| read_skin(&s, buffers)).collect();
    let clips = document
        .animations()
        .map(|a| read_animation(&a, buffers))
        .collect();

    Ok(AssetHandle::new(name, ObjectGraph::new(nodes, meshes, skins), clips))
}

fn read_nodes(document: &gltf::Document) -> Vec<Node> {
    let mut parents = vec![None; document.nodes().len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }

    document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            Node {
                name: node
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("node{}", node.index())),
                parent: parents[node.index()],
                rest: Transform {
                    translation: Vec3::from_array(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from_array(s),
                },
            }
        })
        .collect()
}

fn read_mesh(
    name: &str,
    node: &gltf::Node,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshPrimitive>,
) -> Result<(), LoadError> {
    for prim in mesh.primitives() {
        if prim.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("Skipping {:?} primitive in mesh {}", prim.mode(), mesh.index());
            continue;
        }

        let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
        if positions.is_empty() {
            continue;
        }

        let mut indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        indices.truncate(indices.len() - indices.len() % 3);
        if indices.iter().any(|&i| i as usize >= positions.len()) {
            return Err(LoadError::Parse {
                path: name.to_string(),
                message: format!("mesh {} has an index out of range", mesh.index()),
            });
        }

        let normals = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from_array).collect(),
            None => face_normals(&positions, &indices),
        };

        let skin = node.skin().map(|s| s.index());
        let (joints, weights) = match skin {
            Some(_) => (
                reader
                    .read_joints(0)
                    .map(|j| j.into_u16().collect())
                    .unwrap_or_default(),
                reader
                    .read_weights(0)
                    .map(|w| w.into_f32().collect())
                    .unwrap_or_default(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let counts_match = joints.len() == positions.len() && weights.len() == positions.len();
        if skin.is_some() && !counts_match {
            return Err(LoadError::Parse {
                path: name.to_string(),
                message: format!(
                    "mesh {} has {} positions but {} joints and {} weights",
                    mesh.index(),
                    positions.len(),
                    joints.len(),
                    weights.len()
                ),
            });
        }

        out.push(MeshPrimitive {
            node: node.index(),
            skin,
            positions,
            normals,
            joints,
            weights,
            indices,
            color: prim.material().pbr_metallic_roughness().base_color_factor(),
        });
    }
    Ok(())
}

/// Area-weighted vertex normals for primitives that ship without any
fn face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals.into_iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}

fn read_skin(skin: &gltf::Skin, buffers: &[gltf::buffer::Data]) -> Skin {
    let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
    let reader = skin.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let mut inverse_bind: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|m| m.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();
    inverse_bind.resize(joints.len(), Mat4::IDENTITY);

    Skin {
        joints,
        inverse_bind,
    }
}

fn read_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> AnimationClip {
    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("clip{}", animation.index()));

    let mut channels = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(times) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = times.collect();

        // Cubic spline outputs come as (in-tangent, value, out-tangent)
        let (interpolation, cubic) = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
            gltf::animation::Interpolation::Step => (Interpolation::Step, false),
            gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
        };

        let keyframes = match reader.read_outputs() {
            Some(ReadOutputs::Translations(t)) => {
                Keyframes::Translation(spline_values(t.map(Vec3::from_array), cubic))
            }
            Some(ReadOutputs::Rotations(r)) => {
                Keyframes::Rotation(spline_values(r.into_f32().map(Quat::from_array), cubic))
            }
            Some(ReadOutputs::Scales(s)) => {
                Keyframes::Scale(spline_values(s.map(Vec3::from_array), cubic))
            }
            Some(ReadOutputs::MorphTargetWeights(_)) | None => continue,
        };

        if times.is_empty() || keyframes.len() != times.len() {
            log::warn!(
                "Skipping channel on node {} in {:?}: {} times, {} values",
                channel.target().node().index(),
                name,
                times.len(),
                keyframes.len()
            );
            continue;
        }

        channels.push(Channel {
            node: channel.target().node().index(),
            times,
            keyframes,
            interpolation,
        });
    }

    AnimationClip::new(name, channels)
}

fn spline_values<T>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.skip(1).step_by(3).collect()
    } else {
        values.collect()
    }
}
