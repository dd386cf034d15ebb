//! Geometry counts of a call before its parameters are bound.

use rman_core::{GeometryCounts, ParamValues, Result, Token, tokens};
use rman_scene::{RiCall, counts};
use rman_state::RenderState;

/// Number of vertices implied by the position parameter of `Polygon` and
/// `Points`: `"P"` holds 3 floats per vertex, `"Pw"` 4 and `"Pz"` 1.
#[must_use]
pub fn implied_vertices(tokens: &[Token], values: &[ParamValues<'_>]) -> usize {
    for (token, value) in tokens.iter().zip(values) {
        if token.is_null() {
            break;
        }
        let per_vertex = match token.as_str() {
            tokens::P => 3,
            tokens::PW => 4,
            tokens::PZ => 1,
            _ => continue,
        };
        return value.len() / per_vertex;
    }
    0
}

/// Element counts per storage class for the parameter list of `call`.
///
/// Patch meshes and curves take their step sizes from the current basis.
pub fn geometry_counts(
    call: &RiCall,
    state: &RenderState,
    tokens: &[Token],
    values: &[ParamValues<'_>],
) -> Result<GeometryCounts> {
    let attributes = state.attributes();
    Ok(match call {
        RiCall::Polygon { .. } => counts::polygon(implied_vertices(tokens, values)),
        RiCall::GeneralPolygon { nverts, .. } => counts::general_polygon(nverts),
        RiCall::PointsPolygons { nverts, verts, .. } => counts::points_polygons(nverts, verts),
        RiCall::PointsGeneralPolygons {
            nloops,
            nverts,
            verts,
            ..
        } => counts::points_general_polygons(nloops, nverts, verts),
        RiCall::Patch { ty, .. } => counts::patch(ty.as_str())?,
        RiCall::PatchMesh {
            ty,
            nu,
            uwrap,
            nv,
            vwrap,
            ..
        } => counts::patch_mesh(
            ty.as_str(),
            *nu,
            uwrap.as_str(),
            *nv,
            vwrap.as_str(),
            attributes.u_basis.step,
            attributes.v_basis.step,
        )?,
        RiCall::NuPatch {
            nu,
            uorder,
            nv,
            vorder,
            ..
        } => counts::nu_patch(*nu, *uorder, *nv, *vorder)?,
        RiCall::Sphere { .. }
        | RiCall::Cone { .. }
        | RiCall::Cylinder { .. }
        | RiCall::Hyperboloid { .. }
        | RiCall::Paraboloid { .. }
        | RiCall::Disk { .. }
        | RiCall::Torus { .. } => counts::quadric(),
        RiCall::Points { .. } => counts::points(implied_vertices(tokens, values)),
        RiCall::Curves {
            ty,
            nvertices,
            wrap,
            ..
        } => counts::curves(ty.as_str(), nvertices, wrap.as_str(), attributes.v_basis.step)?,
        RiCall::SubdivisionMesh {
            nvertices,
            vertices,
            ..
        } => counts::subdivision_mesh(nvertices, vertices),
        RiCall::Blobby { nleaf, .. } => counts::blobby(*nleaf),
        _ => GeometryCounts::CONSTANT,
    })
}
