//! Mesh-based measurements of truck solids.
//!
//! truck exposes no mass properties, so volume and extent are taken from a
//! triangulation of the boundary.

use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

type TruckSolid = truck_modeling::Solid;

/// Axis-aligned extent of a tessellated solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Extent {
    /// True when the two extents share interior volume, with `tolerance` slack.
    pub fn overlaps(&self, other: &Extent, tolerance: f64) -> bool {
        (0..3).all(|i| {
            self.min[i] < other.max[i] - tolerance && other.min[i] < self.max[i] - tolerance
        })
    }
}

/// Triangles of every face, oriented outward, as position triples.
fn oriented_triangles(solid: &TruckSolid, tolerance: f64) -> Vec<[[f64; 3]; 3]> {
    let meshed_solid = solid.triangulation(tolerance);
    let mut triangles = Vec::new();

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            // Each meshed face's surface is Option<PolygonMesh>
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };

            // If face is inverted, the mesh needs inversion too
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let positions = face_mesh.positions();
            for tri in face_mesh.tri_faces() {
                let corner = |k: usize| {
                    let p = positions[tri[k].pos];
                    [p[0], p[1], p[2]]
                };
                triangles.push([corner(0), corner(1), corner(2)]);
            }
        }
    }

    triangles
}

/// Signed volume enclosed by the boundary (divergence theorem over the
/// triangulation). Positive for outward-oriented shells.
pub fn solid_volume(solid: &TruckSolid, tolerance: f64) -> f64 {
    oriented_triangles(solid, tolerance)
        .iter()
        .map(|[a, b, c]| dot(*a, cross(*b, *c)) / 6.0)
        .sum()
}

/// Extent of the triangulated boundary, or `None` for an empty solid.
pub fn solid_extent(solid: &TruckSolid, tolerance: f64) -> Option<Extent> {
    let triangles = oriented_triangles(solid, tolerance);
    if triangles.is_empty() {
        return None;
    }
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for p in triangles.iter().flatten() {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    Some(Extent { min, max })
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
