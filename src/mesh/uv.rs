//! Texture coordinates for region surfaces
//!
//! Global UVs map the whole globe onto `[0, 1]²`, so one texture lines up
//! across neighboring regions. Local UVs stretch the region's own bounds onto
//! `[0, 1]²`. Both then go through the same scale, rotate, offset transform.

use glam::{DMat2, DVec2, DVec3};

use crate::config::{UvMode, UvParams};
use crate::geo::GeoPoint;
use crate::projection;

/// Equirectangular UV of a globe position: `u = (lon + 180) / 360`, `v = (lat + 90) / 180`
#[inline]
pub fn global_uv(position: DVec3) -> DVec2 {
    let geo = projection::to_geo(position);
    DVec2::new((geo.lon + 180.0) / 360.0, (geo.lat + 90.0) / 180.0)
}

/// Equirectangular UV of a chart point, longitude taken as given
#[inline]
pub fn chart_uv(point: GeoPoint) -> DVec2 {
    DVec2::new((point.lon + 180.0) / 360.0, (point.lat + 90.0) / 180.0)
}

/// Divide by scale, rotate about the pivot, add the offset
#[inline]
pub fn transform(uv: DVec2, params: &UvParams) -> DVec2 {
    let scaled = uv / params.scale;
    let pivot = params.pivot.point();
    let rotated = DMat2::from_angle(params.rotation) * (scaled - pivot) + pivot;
    rotated + params.offset
}

/// Compute UVs for every position, writing into `out`
///
/// `sources` holds the chart point each position was projected from. Global
/// UVs come from the inverse projection of `positions`. Local UVs are
/// normalized over the bounds of `sources`, so regions given with longitudes
/// past ±180 keep a tight box.
pub fn compute_uvs(
    positions: &[DVec3],
    sources: &[GeoPoint],
    params: &UvParams,
    out: &mut Vec<[f32; 2]>,
) {
    out.clear();
    out.reserve(positions.len());

    match params.mode {
        UvMode::Global => {
            out.extend(
                positions
                    .iter()
                    .map(|&p| to_f32(transform(global_uv(p), params))),
            );
        }
        UvMode::Local => {
            let raw: Vec<DVec2> = sources.iter().map(|&p| chart_uv(p)).collect();
            let (min, max) = raw.iter().fold(
                (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
                |(lo, hi), &uv| (lo.min(uv), hi.max(uv)),
            );
            let extent = max - min;
            let inv = DVec2::new(
                if extent.x > 0.0 { 1.0 / extent.x } else { 0.0 },
                if extent.y > 0.0 { 1.0 / extent.y } else { 0.0 },
            );
            out.extend(
                raw.into_iter()
                    .map(|uv| to_f32(transform((uv - min) * inv, params))),
            );
        }
    }
}

#[inline]
fn to_f32(uv: DVec2) -> [f32; 2] {
    [uv.x as f32, uv.y as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UvPivot;
    use crate::projection::to_sphere;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_global_uv_reference_points() {
        let uv = global_uv(to_sphere(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(uv.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(uv.y, 0.5, epsilon = 1e-9);

        let uv = global_uv(to_sphere(45.0, 90.0, 10.0));
        assert_abs_diff_eq!(uv.x, 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(uv.y, 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_identity_transform() {
        let uv = DVec2::new(0.3, 0.7);
        assert_eq!(transform(uv, &UvParams::default()), uv);
    }

    #[test]
    fn test_transform_order() {
        let params = UvParams {
            scale: 2.0,
            rotation: FRAC_PI_2,
            offset: DVec2::new(0.1, 0.0),
            pivot: UvPivot::Origin,
            ..UvParams::default()
        };
        // (1, 0) / 2 = (0.5, 0), rotated a quarter turn = (0, 0.5), offset = (0.1, 0.5)
        let uv = transform(DVec2::new(1.0, 0.0), &params);
        assert_abs_diff_eq!(uv.x, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(uv.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_center_pivot_keeps_center() {
        let params = UvParams {
            rotation: 1.234,
            pivot: UvPivot::Center,
            ..UvParams::default()
        };
        let uv = transform(DVec2::splat(0.5), &params);
        assert_abs_diff_eq!(uv.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(uv.y, 0.5, epsilon = 1e-12);
    }

    fn projected(points: &[(f64, f64)]) -> (Vec<DVec3>, Vec<GeoPoint>) {
        let sources: Vec<GeoPoint> = points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect();
        let positions = sources.iter().map(|p| to_sphere(p.lat, p.lon, 0.0)).collect();
        (positions, sources)
    }

    #[test]
    fn test_local_mode_spans_unit_square() {
        let (positions, sources) =
            projected(&[(10.0, 20.0), (10.0, 30.0), (15.0, 30.0), (15.0, 20.0)]);
        let params = UvParams {
            mode: UvMode::Local,
            ..UvParams::default()
        };
        let mut out = Vec::new();
        compute_uvs(&positions, &sources, &params, &mut out);

        assert_eq!(out.len(), 4);
        assert_abs_diff_eq!(out[0][0], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out[0][1], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out[2][0], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out[2][1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_local_mode_degenerate_extent() {
        let (positions, sources) = projected(&[(5.0, 5.0), (5.0, 5.0)]);
        let params = UvParams {
            mode: UvMode::Local,
            ..UvParams::default()
        };
        let mut out = Vec::new();
        compute_uvs(&positions, &sources, &params, &mut out);
        assert!(out.iter().all(|uv| uv[0].is_finite() && uv[1].is_finite()));
    }

    #[test]
    fn test_local_bounds_ignore_longitude_wrap() {
        // 175..185 projects onto -175 for the eastern edge
        let (positions, sources) =
            projected(&[(0.0, 175.0), (0.0, 185.0), (5.0, 185.0), (5.0, 175.0)]);
        let params = UvParams {
            mode: UvMode::Local,
            ..UvParams::default()
        };
        let mut out = Vec::new();
        compute_uvs(&positions, &sources, &params, &mut out);
        assert_abs_diff_eq!(out[0][0], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out[1][0], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(out[2][1], 1.0, epsilon = 1e-5);

        // Global mode still follows the inverse projection
        let mut global = Vec::new();
        compute_uvs(&positions, &sources, &UvParams::default(), &mut global);
        assert_abs_diff_eq!(global[1][0], 5.0 / 360.0, epsilon = 1e-5);
    }
}
