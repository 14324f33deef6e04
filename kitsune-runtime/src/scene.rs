//! glTF character loading: node hierarchy, one skinned mesh, its skin and
//! every animation clip, flattened into plain data ready for the runtime.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::util::{ReadIndices, ReadJoints, ReadWeights};
use kitsune_gpu_shared::uniforms::SkinnedVertex;

use crate::animation::{AnimationChannel, AnimationClip, ChannelValues, Interpolation};
use crate::error::ModelError;
use crate::transform::NodeTransform;

/// One node of the model hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub rest: NodeTransform,
}

/// Decoded base color image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// 1, 3 or 4 bytes per pixel.
    pub channels: u32,
    pub pixels: Vec<u8>,
}

/// The drawable part of the model, merged from all primitives of one mesh.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    /// Node the mesh is attached to.
    pub node: usize,
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub texture: Option<TextureData>,
}

/// Joint list of the mesh's skin.
#[derive(Debug, Clone)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub nodes: Vec<Node>,
    /// Node indices, parents before children.
    pub traversal: Vec<usize>,
    pub mesh: Option<SkinnedMesh>,
    pub skin: Option<Skin>,
    pub clips: Vec<AnimationClip>,
}

impl LoadedModel {
    /// Load a `.gltf` or `.glb` from disk, resolving external buffers and
    /// images relative to the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let (document, buffers, images) = gltf::import(path.as_ref())?;
        Self::from_gltf(&document, &buffers, &images)
    }

    /// Load from in-memory bytes. External URIs other than data URIs fail.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let (document, buffers, images) = gltf::import_slice(bytes)?;
        Self::from_gltf(&document, &buffers, &images)
    }

    pub fn from_gltf(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        images: &[gltf::image::Data],
    ) -> Result<Self, ModelError> {
        let nodes = read_nodes(document);
        let traversal = traversal_order(&nodes);

        let mesh_node = document
            .nodes()
            .find(|n| n.mesh().is_some() && n.skin().is_some())
            .or_else(|| document.nodes().find(|n| n.mesh().is_some()));

        let mut mesh = None;
        let mut skin = None;
        if let Some(node) = mesh_node {
            skin = node.skin().map(|s| read_skin(&s, buffers));
            mesh = node
                .mesh()
                .and_then(|m| read_mesh(node.index(), &m, buffers, images));
        }

        let clips: Vec<AnimationClip> = document
            .animations()
            .map(|a| read_clip(&a, buffers))
            .collect();

        log::info!(
            "loaded model: {} nodes, {} vertices, {} joints, {} clips [{}]",
            nodes.len(),
            mesh.as_ref().map_or(0, |m| m.vertices.len()),
            skin.as_ref().map_or(0, |s| s.joints.len()),
            clips.len(),
            clips
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );

        Ok(Self {
            nodes,
            traversal,
            mesh,
            skin,
            clips,
        })
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }
}

fn read_nodes(document: &gltf::Document) -> Vec<Node> {
    let count = document.nodes().len();
    let mut parent = vec![None; count];
    for n in document.nodes() {
        for c in n.children() {
            parent[c.index()] = Some(n.index());
        }
    }

    document
        .nodes()
        .map(|n| {
            let (t, r, s) = n.transform().decomposed();
            Node {
                name: n.name().unwrap_or("").to_string(),
                parent: parent[n.index()],
                rest: NodeTransform {
                    translation: Vec3::from(t),
                    rotation: Quat::from_array(r).normalize(),
                    scale: Vec3::from(s),
                },
            }
        })
        .collect()
}

/// Depth-first, parents before children, roots in index order.
pub(crate) fn traversal_order(nodes: &[Node]) -> Vec<usize> {
    let mut children = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        if let Some(p) = node.parent {
            children[p].push(i);
        }
    }

    let mut order = Vec::with_capacity(nodes.len());
    let mut stack: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.parent.is_none())
        .map(|(i, _)| i)
        .rev()
        .collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }
    order
}

fn read_skin(skin: &gltf::Skin, buffers: &[gltf::buffer::Data]) -> Skin {
    let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
    let reader = skin.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let inverse_bind = match reader.read_inverse_bind_matrices() {
        Some(iter) => iter.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
        None => vec![Mat4::IDENTITY; joints.len()],
    };
    Skin {
        joints,
        inverse_bind,
    }
}

fn read_mesh(
    node: usize,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Option<SkinnedMesh> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for prim in mesh.primitives() {
        let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let n = positions.len();

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|it| it.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; n]);
        let uv_set = prim
            .material()
            .pbr_metallic_roughness()
            .base_color_texture()
            .map(|t| t.tex_coord())
            .unwrap_or(0);
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(uv_set)
            .map(|tc| tc.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; n]);
        let joints: Vec<[u32; 4]> = match reader.read_joints(0) {
            Some(ReadJoints::U8(it)) => it.map(|j| j.map(u32::from)).collect(),
            Some(ReadJoints::U16(it)) => it.map(|j| j.map(u32::from)).collect(),
            None => vec![[0; 4]; n],
        };
        let weights: Vec<[f32; 4]> = match reader.read_weights(0) {
            Some(ReadWeights::F32(it)) => it.collect(),
            Some(ReadWeights::U16(it)) => it.map(|w| w.map(|v| v as f32 / 65535.0)).collect(),
            Some(ReadWeights::U8(it)) => it.map(|w| w.map(|v| v as f32 / 255.0)).collect(),
            None => vec![[1.0, 0.0, 0.0, 0.0]; n],
        };

        let base = vertices.len() as u32;
        for i in 0..n {
            vertices.push(SkinnedVertex {
                position: positions[i],
                normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                joints: joints.get(i).copied().unwrap_or([0; 4]),
                weights: weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0]),
            });
        }
        match reader.read_indices() {
            Some(ReadIndices::U8(it)) => indices.extend(it.map(|i| base + i as u32)),
            Some(ReadIndices::U16(it)) => indices.extend(it.map(|i| base + i as u32)),
            Some(ReadIndices::U32(it)) => indices.extend(it.map(|i| base + i)),
            None => indices.extend(base..base + n as u32),
        }
    }

    if vertices.is_empty() {
        log::warn!("mesh on node {node} has no primitive with positions");
        return None;
    }

    let material = mesh.primitives().next().map(|p| p.material());
    let pbr = material.as_ref().map(|m| m.pbr_metallic_roughness());
    let texture = pbr
        .as_ref()
        .and_then(|p| p.base_color_texture())
        .and_then(|info| images.get(info.texture().source().index()))
        .and_then(read_texture);

    Some(SkinnedMesh {
        node,
        vertices,
        indices,
        base_color: pbr.as_ref().map_or([1.0; 4], |p| p.base_color_factor()),
        metalness: pbr.as_ref().map_or(1.0, |p| p.metallic_factor()),
        roughness: pbr.as_ref().map_or(1.0, |p| p.roughness_factor()),
        texture,
    })
}

fn read_texture(image: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;
    let channels = match image.format {
        Format::R8 => 1,
        Format::R8G8B8 => 3,
        Format::R8G8B8A8 => 4,
        other => {
            log::warn!("skipping base color texture in unsupported format {other:?}");
            return None;
        }
    };
    Some(TextureData {
        width: image.width,
        height: image.height,
        channels,
        pixels: image.pixels.clone(),
    })
}

fn read_clip(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> AnimationClip {
    let mut channels = Vec::new();
    for ch in animation.channels() {
        let reader = ch.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };
        let interpolation = match ch.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };
        let values = match outputs {
            ReadOutputs::Translations(it) => ChannelValues::Translation(it.map(Vec3::from).collect()),
            ReadOutputs::Scales(it) => ChannelValues::Scale(it.map(Vec3::from).collect()),
            ReadOutputs::Rotations(it) => ChannelValues::Rotation(
                it.into_f32()
                    .enumerate()
                    .map(|(i, q)| read_rotation(q, interpolation, i))
                    .collect(),
            ),
            // morph targets are not animated
            ReadOutputs::MorphTargetWeights(_) => continue,
        };
        channels.push(AnimationChannel {
            target_node: ch.target().node().index(),
            interpolation,
            times: inputs.collect(),
            values,
        });
    }
    AnimationClip::new(animation.name().unwrap_or(""), channels)
}

/// Cubic-spline outputs come as `[in_tangent, value, out_tangent]` triples.
/// Only the value is a unit quaternion, so tangents are kept as read.
fn read_rotation(q: [f32; 4], interpolation: Interpolation, index: usize) -> Quat {
    let q = Quat::from_array(q);
    match interpolation {
        Interpolation::CubicSpline if index % 3 != 1 => q,
        _ => q.normalize(),
    }
}

#[cfg(test)]
pub(crate) mod test_models {
    use super::*;

    /// Root joint, one child joint one unit up, a rigid-bound triangle
    /// on a separate mesh node, plus an idle clip and a walk clip.
    pub(crate) fn two_clip_rig() -> LoadedModel {
        let nodes = vec![
            Node {
                name: "root".into(),
                parent: None,
                rest: NodeTransform::default(),
            },
            Node {
                name: "bone".into(),
                parent: Some(0),
                rest: NodeTransform {
                    translation: Vec3::Y,
                    ..Default::default()
                },
            },
            Node {
                name: "body".into(),
                parent: None,
                rest: NodeTransform::default(),
            },
        ];
        let traversal = traversal_order(&nodes);

        let vertex = |position: [f32; 3], joint: u32| SkinnedVertex {
            position,
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
            joints: [joint, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        };

        let idle = AnimationClip::new(
            "Survey",
            vec![AnimationChannel {
                target_node: 1,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: ChannelValues::Translation(vec![Vec3::Y, Vec3::new(0.0, 1.5, 0.0)]),
            }],
        );
        let walk = AnimationClip::new(
            "Walk",
            vec![AnimationChannel {
                target_node: 0,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 0.5],
                values: ChannelValues::Rotation(vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                ]),
            }],
        );

        LoadedModel {
            nodes,
            traversal,
            mesh: Some(SkinnedMesh {
                node: 2,
                vertices: vec![
                    vertex([0.0, 0.0, 0.0], 0),
                    vertex([1.0, 0.0, 0.0], 0),
                    vertex([0.0, 2.0, 0.0], 1),
                ],
                indices: vec![0, 1, 2],
                base_color: [1.0, 0.5, 0.25, 1.0],
                metalness: 0.0,
                roughness: 0.8,
                texture: None,
            }),
            skin: Some(Skin {
                joints: vec![0, 1],
                inverse_bind: vec![Mat4::IDENTITY, Mat4::from_translation(-Vec3::Y)],
            }),
            clips: vec![idle, walk],
        }
    }
}
