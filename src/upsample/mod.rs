//! Raster-overlay geometry upsampling (spec §4.3): clip a parent mesh to
//! one UV quadrant (`clip`), then rebuild its skirt (`skirt`). This module
//! is the glue the spec's "Input/Output" contract describes; the quadrant
//! clip and skirt steps have no teacher counterpart (`abetterworld` does
//! no CPU-side geometry upsampling at all) and are written from the
//! spec's algorithm description directly.

pub mod clip;
pub mod mesh;
pub mod skirt;

pub use clip::clip_to_quadrant;
pub use mesh::{Mesh, Quadrant, SkirtMetadata, UpsampleResult, Vertex};
pub use skirt::regenerate_skirt;

use crate::error::TfError;

fn validate_mesh(mesh: &Mesh) -> Result<(), TfError> {
    if mesh.indices.len() % 3 != 0 {
        return Err(TfError::Upsample(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        )));
    }
    for &idx in &mesh.indices {
        if idx as usize >= mesh.vertices.len() {
            return Err(TfError::Upsample(format!(
                "index {idx} out of bounds for {} vertices",
                mesh.vertices.len()
            )));
        }
    }
    Ok(())
}

/// Which of a quadrant's four UV-space edges coincide with one of the
/// parent tile's own edges, versus which are newly introduced by the
/// quadrant cut (spec §4.3.4: "a quadrant-interior edge (one that was not
/// an edge of the parent tile)").
struct EdgeKind {
    west_is_tile_edge: bool,
    south_is_tile_edge: bool,
    east_is_tile_edge: bool,
    north_is_tile_edge: bool,
}

fn edge_kind(quadrant: Quadrant) -> EdgeKind {
    match quadrant {
        Quadrant::LowerLeft => EdgeKind {
            west_is_tile_edge: true,
            south_is_tile_edge: true,
            east_is_tile_edge: false,
            north_is_tile_edge: false,
        },
        Quadrant::LowerRight => EdgeKind {
            west_is_tile_edge: false,
            south_is_tile_edge: true,
            east_is_tile_edge: true,
            north_is_tile_edge: false,
        },
        Quadrant::UpperLeft => EdgeKind {
            west_is_tile_edge: true,
            south_is_tile_edge: false,
            east_is_tile_edge: false,
            north_is_tile_edge: true,
        },
        Quadrant::UpperRight => EdgeKind {
            west_is_tile_edge: false,
            south_is_tile_edge: false,
            east_is_tile_edge: true,
            north_is_tile_edge: true,
        },
    }
}

/// A quadrant-interior edge halves the parent's matching skirt height;
/// an edge that's still one of the parent tile's own edges keeps it in
/// full (spec §4.3.4).
fn quadrant_skirt_metadata(parent: &SkirtMetadata, quadrant: Quadrant) -> SkirtMetadata {
    let kind = edge_kind(quadrant);
    let half_unless = |is_tile_edge: bool, height: f64| if is_tile_edge { height } else { height * 0.5 };
    SkirtMetadata {
        down: parent.down,
        west_height: half_unless(kind.west_is_tile_edge, parent.west_height),
        south_height: half_unless(kind.south_is_tile_edge, parent.south_height),
        east_height: half_unless(kind.east_is_tile_edge, parent.east_height),
        north_height: half_unless(kind.north_is_tile_edge, parent.north_height),
        non_skirt_vertex_count: 0,
    }
}

/// Clips `parent` to `quadrant`'s quarter of UV space and rebuilds its
/// skirt (spec §4.3). Fails only when `parent` is malformed (mismatched
/// index/vertex counts); a quadrant with no intersecting geometry is not
/// an error, it just yields an empty mesh (spec §4.3, "Failure").
pub fn upsample_quadrant(
    parent: &Mesh,
    quadrant: Quadrant,
    v_inverted: bool,
    parent_skirt: Option<SkirtMetadata>,
) -> Result<UpsampleResult, TfError> {
    validate_mesh(parent)?;

    let mut mesh = clip_to_quadrant(parent, quadrant, v_inverted);
    let skirt = parent_skirt.map(|parent_meta| {
        let meta = quadrant_skirt_metadata(&parent_meta, quadrant);
        regenerate_skirt(&mut mesh, meta)
    });

    Ok(UpsampleResult { mesh, skirt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Vector3};

    fn v(u: f64, vv: f64) -> Vertex {
        Vertex {
            position: Point3::new(u, vv, 0.0),
            uv: (u, vv),
            normal: None,
        }
    }

    fn unit_square() -> Mesh {
        Mesh {
            vertices: vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn malformed_index_count_is_rejected() {
        let mut parent = unit_square();
        parent.indices.push(0);
        let err = upsample_quadrant(&parent, Quadrant::LowerLeft, false, None).unwrap_err();
        assert!(matches!(err, TfError::Upsample(_)));
    }

    #[test]
    fn out_of_bounds_index_is_rejected() {
        let mut parent = unit_square();
        parent.indices[0] = 99;
        let err = upsample_quadrant(&parent, Quadrant::LowerLeft, false, None).unwrap_err();
        assert!(matches!(err, TfError::Upsample(_)));
    }

    #[test]
    fn interior_edges_get_half_the_parent_skirt_height() {
        let parent = unit_square();
        let parent_skirt = SkirtMetadata {
            down: Vector3::new(0.0, 0.0, -1.0),
            west_height: 10.0,
            south_height: 10.0,
            east_height: 10.0,
            north_height: 10.0,
            non_skirt_vertex_count: 4,
        };
        // LowerLeft: west/south are real tile edges (full height), east/north
        // are the quadrant cut (half height).
        let kind = edge_kind(Quadrant::LowerLeft);
        let meta = quadrant_skirt_metadata(&parent_skirt, Quadrant::LowerLeft);
        assert!(kind.west_is_tile_edge && kind.south_is_tile_edge);
        assert_eq!(meta.west_height, 10.0);
        assert_eq!(meta.south_height, 10.0);
        assert_eq!(meta.east_height, 5.0);
        assert_eq!(meta.north_height, 5.0);
    }

    #[test]
    fn upsample_produces_skirt_when_parent_has_one() {
        let parent = unit_square();
        let parent_skirt = SkirtMetadata {
            down: Vector3::new(0.0, 0.0, -1.0),
            west_height: 10.0,
            south_height: 10.0,
            east_height: 10.0,
            north_height: 10.0,
            non_skirt_vertex_count: 4,
        };
        let result = upsample_quadrant(&parent, Quadrant::LowerLeft, false, Some(parent_skirt)).unwrap();
        let skirt = result.skirt.expect("skirt metadata");
        assert!(result.mesh.vertices.len() > skirt.non_skirt_vertex_count);
    }

    #[test]
    fn upsample_without_parent_skirt_has_no_skirt() {
        let parent = unit_square();
        let result = upsample_quadrant(&parent, Quadrant::UpperRight, false, None).unwrap();
        assert!(result.skirt.is_none());
    }
}
