//! Geometry counts per primitive.
//!
//! The number of values each storage class asks for, derived from a
//! primitive's positional arguments. Binding uses these to size the buffers
//! of the primitive's parameter list.

use rman_core::{ErrorCode, GeometryCounts, Result, RiError, tokens};

/// Largest element count of one storage class; value arrays are indexed by
/// 32-bit integers.
pub const MAX_ELEMENTS: usize = i32::MAX as usize;

fn product(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b)
        .filter(|&n| n <= MAX_ELEMENTS)
        .ok_or_else(|| {
            RiError::error(
                ErrorCode::Limit,
                format!("{a} x {b} elements exceed the limit of {MAX_ELEMENTS}"),
            )
        })
}

fn sum(values: &[i32]) -> usize {
    values.iter().map(|&v| v.max(0) as usize).sum()
}

fn max_index(indices: &[i32]) -> usize {
    indices.iter().map(|&i| i.max(0) as usize + 1).max().unwrap_or(0)
}

fn is_periodic(wrap: &str) -> Result<bool> {
    match wrap {
        tokens::PERIODIC => Ok(true),
        tokens::NONPERIODIC => Ok(false),
        other => Err(RiError::error(
            ErrorCode::BadToken,
            format!("unknown wrap mode \"{other}\""),
        )),
    }
}

/// Single polygon.
#[must_use]
pub fn polygon(nvertices: usize) -> GeometryCounts {
    GeometryCounts::polygon(nvertices)
}

/// Polygon with holes.
#[must_use]
pub fn general_polygon(nverts: &[i32]) -> GeometryCounts {
    let n = sum(nverts);
    GeometryCounts::new(n, n, 1, n, n)
}

/// Polygon mesh sharing vertices.
#[must_use]
pub fn points_polygons(nverts: &[i32], verts: &[i32]) -> GeometryCounts {
    let points = max_index(verts);
    let face_vertices = sum(nverts);
    GeometryCounts::new(points, points, nverts.len(), face_vertices, face_vertices)
}

/// Mesh of polygons with holes.
#[must_use]
pub fn points_general_polygons(nloops: &[i32], _nverts: &[i32], verts: &[i32]) -> GeometryCounts {
    let points = max_index(verts);
    let face_vertices = verts.len();
    GeometryCounts::new(points, points, nloops.len(), face_vertices, face_vertices)
}

/// Single bilinear or bicubic patch.
pub fn patch(ty: &str) -> Result<GeometryCounts> {
    match ty {
        tokens::BILINEAR => Ok(GeometryCounts::new(4, 4, 1, 4, 4)),
        tokens::BICUBIC => Ok(GeometryCounts::new(16, 4, 1, 16, 4)),
        other => Err(RiError::error(
            ErrorCode::BadToken,
            format!("unknown patch type \"{other}\""),
        )),
    }
}

/// Patches and varying values along one parametric direction.
fn mesh_direction(bicubic: bool, n: i32, periodic: bool, step: u32) -> Result<(usize, usize)> {
    let n = n.max(0) as usize;
    let step = step.max(1) as usize;
    let patches = match (bicubic, periodic) {
        (false, true) => n,
        (false, false) => n.saturating_sub(1),
        (true, true) => n / step,
        (true, false) => {
            if n < 4 {
                return Err(RiError::error(
                    ErrorCode::Consistency,
                    format!("bicubic patch mesh needs at least 4 vertices, got {n}"),
                ));
            }
            (n - 4) / step + 1
        }
    };
    let varying = if periodic { patches } else { patches + 1 };
    Ok((patches, varying))
}

/// Patch mesh; `ustep`/`vstep` come from the current basis.
pub fn patch_mesh(
    ty: &str,
    nu: i32,
    uwrap: &str,
    nv: i32,
    vwrap: &str,
    ustep: u32,
    vstep: u32,
) -> Result<GeometryCounts> {
    let bicubic = match ty {
        tokens::BILINEAR => false,
        tokens::BICUBIC => true,
        other => {
            return Err(RiError::error(
                ErrorCode::BadToken,
                format!("unknown patch type \"{other}\""),
            ));
        }
    };
    let (upatches, uvarying) = mesh_direction(bicubic, nu, is_periodic(uwrap)?, ustep)?;
    let (vpatches, vvarying) = mesh_direction(bicubic, nv, is_periodic(vwrap)?, vstep)?;
    let vertices = product(nu.max(0) as usize, nv.max(0) as usize)?;
    let varying = product(uvarying, vvarying)?;
    let uniform = product(upatches, vpatches)?;
    let corners = product(uniform, 4)?;
    Ok(GeometryCounts::new(vertices, varying, uniform, corners, corners))
}

/// NURBS patch.
pub fn nu_patch(nu: i32, uorder: i32, nv: i32, vorder: i32) -> Result<GeometryCounts> {
    if uorder < 1 || vorder < 1 || nu < uorder || nv < vorder {
        return Err(RiError::error(
            ErrorCode::Consistency,
            format!("NuPatch {nu}x{nv} with orders {uorder}x{vorder}"),
        ));
    }
    let usegments = (nu - uorder + 1) as usize;
    let vsegments = (nv - vorder + 1) as usize;
    let vertices = product(nu as usize, nv as usize)?;
    let varying = product(usegments + 1, vsegments + 1)?;
    let uniform = product(usegments, vsegments)?;
    let corners = product(uniform, 4)?;
    Ok(GeometryCounts::new(vertices, varying, uniform, corners, corners))
}

/// Quadrics and tori behave like one bilinear patch.
#[must_use]
pub fn quadric() -> GeometryCounts {
    GeometryCounts::new(4, 4, 1, 4, 4)
}

/// Point cloud.
#[must_use]
pub fn points(npoints: usize) -> GeometryCounts {
    GeometryCounts::new(npoints, npoints, 1, npoints, npoints)
}

/// Linear or cubic curves; `vstep` comes from the current v basis.
pub fn curves(ty: &str, nvertices: &[i32], wrap: &str, vstep: u32) -> Result<GeometryCounts> {
    let cubic = match ty {
        tokens::LINEAR => false,
        tokens::CUBIC => true,
        other => {
            return Err(RiError::error(
                ErrorCode::BadToken,
                format!("unknown curve type \"{other}\""),
            ));
        }
    };
    let periodic = is_periodic(wrap)?;
    let mut varying = 0;
    for &n in nvertices {
        let (_, v) = mesh_direction(cubic, n, periodic, vstep)?;
        varying += v;
    }
    let vertices = sum(nvertices);
    Ok(GeometryCounts::new(vertices, varying, nvertices.len(), varying, varying))
}

/// Subdivision mesh.
#[must_use]
pub fn subdivision_mesh(nvertices: &[i32], vertices: &[i32]) -> GeometryCounts {
    let points = max_index(vertices);
    let face_vertices = sum(nvertices);
    GeometryCounts::new(points, points, nvertices.len(), face_vertices, face_vertices)
}

/// Blobby with `nleaf` primitive fields.
#[must_use]
pub fn blobby(nleaf: i32) -> GeometryCounts {
    let n = nleaf.max(0) as usize;
    GeometryCounts::new(n, n, 1, n, n)
}
