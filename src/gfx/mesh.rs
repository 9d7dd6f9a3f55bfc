//! CPU-side vertex assembly for everything the GPU renderer draws.

use glam::Vec3;

use crate::animation::{deform, Pose};
use crate::asset::ObjectGraph;
use crate::math::srgb_to_linear;
use crate::scene::{GridHelper, GroundPlane};
use crate::types::MeshVertex;

/// Two triangles spanning the floor at y = 0, facing up
pub fn ground_mesh(ground: &GroundPlane) -> (Vec<MeshVertex>, Vec<u32>) {
    let h = ground.size * 0.5;
    let [r, g, b] = srgb_to_linear(ground.color);
    let color = [r, g, b, 1.0];
    let up = [0.0, 1.0, 0.0];

    let vertices = [[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]]
        .into_iter()
        .map(|p| MeshVertex::new(p, up, color))
        .collect();
    // Counter-clockwise seen from above
    let indices = vec![0, 3, 2, 0, 2, 1];
    (vertices, indices)
}

/// Line-list vertices for the floor grid
pub fn grid_lines(grid: &GridHelper) -> Vec<MeshVertex> {
    let [r, g, b] = srgb_to_linear(grid.color);
    let color = [r, g, b, grid.opacity];
    let up = [0.0, 1.0, 0.0];

    grid.segments()
        .into_iter()
        .flat_map(|(a, b)| {
            [
                MeshVertex::new(a.to_array(), up, color),
                MeshVertex::new(b.to_array(), up, color),
            ]
        })
        .collect()
}

/// Static index layout of an asset; vertices are refreshed every frame
#[derive(Debug, Clone)]
pub struct AssetMesh {
    indices: Vec<u32>,
    vertex_count: usize,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl AssetMesh {
    /// Concatenates every primitive, offsetting indices into one buffer
    pub fn new(graph: &ObjectGraph) -> Self {
        let mut indices = Vec::with_capacity(graph.index_count());
        let mut base = 0u32;
        for mesh in graph.meshes() {
            indices.extend(mesh.indices.iter().map(|i| i + base));
            base += mesh.vertex_count() as u32;
        }

        Self {
            indices,
            vertex_count: base as usize,
            positions: Vec::new(),
            normals: Vec::new(),
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Writes the posed vertices of every primitive into `out`
    pub fn pose_vertices(&mut self, graph: &ObjectGraph, pose: &Pose, out: &mut Vec<MeshVertex>) {
        out.clear();
        out.reserve(self.vertex_count);

        for mesh in graph.meshes() {
            deform(graph, pose, mesh, &mut self.positions, &mut self.normals);
            out.extend(
                self.positions
                    .iter()
                    .zip(&self.normals)
                    .map(|(p, n)| MeshVertex::new(p.to_array(), n.to_array(), mesh.color)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MeshPrimitive, Node, Transform};
    use glam::Mat4;

    fn triangle(node: usize) -> MeshPrimitive {
        MeshPrimitive {
            node,
            skin: None,
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            joints: vec![],
            weights: vec![],
            indices: vec![0, 1, 2],
            color: [1.0, 0.0, 0.0, 1.0],
        }
    }

    fn two_triangles() -> ObjectGraph {
        let nodes = vec![
            Node {
                name: "a".into(),
                parent: None,
                rest: Transform::IDENTITY,
            },
            Node {
                name: "b".into(),
                parent: Some(0),
                rest: Transform {
                    translation: Vec3::new(0.0, 5.0, 0.0),
                    ..Transform::IDENTITY
                },
            },
        ];
        ObjectGraph::new(nodes, vec![triangle(0), triangle(1)], vec![])
    }

    #[test]
    fn test_ground_faces_up() {
        let ground = GroundPlane {
            size: 2000.0,
            color: [0.6, 0.6, 0.6],
            receive_shadow: true,
            depth_write: false,
        };
        let (vertices, indices) = ground_mesh(&ground);

        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);
        assert!(vertices.iter().all(|v| v.position[1] == 0.0));
        assert!(vertices.iter().any(|v| v.position[0] == 1000.0));

        let p = |i: u32| Vec3::from_array(vertices[i as usize].position);
        let n = (p(indices[1]) - p(indices[0])).cross(p(indices[2]) - p(indices[0]));
        assert!(n.y > 0.0);
    }

    #[test]
    fn test_grid_line_vertices_carry_opacity() {
        let grid = GridHelper {
            size: 10.0,
            divisions: 2,
            color: [0.0; 3],
            opacity: 0.2,
        };
        let vertices = grid_lines(&grid);

        assert_eq!(vertices.len(), 12);
        assert!(vertices.iter().all(|v| v.color == [0.0, 0.0, 0.0, 0.2]));
    }

    #[test]
    fn test_asset_indices_offset_per_primitive() {
        let mesh = AssetMesh::new(&two_triangles());
        assert_eq!(mesh.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_pose_vertices_follow_node_transforms() {
        let graph = two_triangles();
        let pose = Pose::rest(&graph, Mat4::IDENTITY);
        let mut mesh = AssetMesh::new(&graph);
        let mut out = Vec::new();

        mesh.pose_vertices(&graph, &pose, &mut out);

        assert_eq!(out.len(), 6);
        assert_eq!(out[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(out[3].position, [0.0, 5.0, 0.0]);
        assert_eq!(out[5].color, [1.0, 0.0, 0.0, 1.0]);
    }
}
