//! CPU-side geometry for the globe shells, marker boxes and stars.

use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Unit UV sphere with +Y north. `u` runs with longitude from the
/// antimeridian, `v` from the north pole, so an equirectangular map lands
/// where `lat_lon_to_sphere` places coordinates.
pub fn uv_sphere(lat_segments: u32, lon_segments: u32) -> Mesh {
    let lat_segments = lat_segments.max(3);
    let lon_segments = lon_segments.max(3);

    let mut vertices = Vec::with_capacity(((lat_segments + 1) * (lon_segments + 1)) as usize);
    for lat in 0..=lat_segments {
        let v = lat as f32 / lat_segments as f32;
        let theta = v * PI;
        let (sin_t, cos_t) = theta.sin_cos();

        for lon in 0..=lon_segments {
            let u = lon as f32 / lon_segments as f32;
            let (sin_p, cos_p) = (u * TAU).sin_cos();
            let p = [-cos_p * sin_t, cos_t, sin_p * sin_t];
            vertices.push(MeshVertex {
                position: p,
                normal: p,
                uv: [u, v],
            });
        }
    }

    let stride = lon_segments + 1;
    let mut indices = Vec::with_capacity((lat_segments * lon_segments * 6) as usize);
    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let i0 = lat * stride + lon;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            indices.extend([i0, i2, i1, i1, i2, i3].map(|i| i as u16));
        }
    }

    Mesh { vertices, indices }
}

/// Unit cube centered on the origin, flat-shaded (24 vertices).
pub fn unit_box() -> Mesh {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]),
    ];

    let mut mesh = Mesh::default();
    for (normal, up, right) in FACES {
        let base = mesh.vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = [0, 1, 2].map(|i| 0.5 * (normal[i] + su * right[i] + sv * up[i]));
            mesh.vertices.push(MeshVertex {
                position,
                normal,
                uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
            });
        }
        mesh.indices
            .extend([0, 1, 2, 0, 2, 3].map(|i: u16| base + i));
    }
    mesh
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Per-instance data for one marker box.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}
