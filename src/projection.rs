//! Spherical projection between geographic coordinates and globe space
//!
//! The globe is Y-up: latitude rotates toward +Y, longitude rotates from +X
//! toward +Z. Seen from outside the sphere this mirrors the (lon, lat) chart
//! plane, which is why assembled surfaces reverse the winding of every
//! triangle produced in the chart plane.

use glam::DVec3;

use crate::geo::GeoPoint;

/// Globe radius in world units
pub const EARTH_RADIUS: f64 = 6_371.0;

/// A point in globe space (world units, sphere centered at the origin)
pub type SpherePoint = DVec3;

/// Project latitude/longitude (degrees) to a point at `altitude` above the sphere
///
/// # Example
///
/// ```
/// use globe_region_mesh::projection::{to_sphere, EARTH_RADIUS};
///
/// let p = to_sphere(0.0, 0.0, 0.0);
/// assert!((p.x - EARTH_RADIUS).abs() < 1e-9);
/// assert!(p.y.abs() < 1e-9 && p.z.abs() < 1e-9);
/// ```
#[inline]
pub fn to_sphere(lat: f64, lon: f64, altitude: f64) -> SpherePoint {
    let radius = EARTH_RADIUS + altitude;
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    DVec3::new(
        radius * cos_lat * cos_lon,
        radius * sin_lat,
        radius * cos_lat * sin_lon,
    )
}

/// Project a [`GeoPoint`] at `altitude`
#[inline]
pub fn project(point: GeoPoint, altitude: f64) -> SpherePoint {
    to_sphere(point.lat, point.lon, altitude)
}

/// Inverse projection back to latitude/longitude in degrees
///
/// Longitude comes back in `(-180, 180]`. The origin has no direction and
/// maps to `(0, 0)`.
#[inline]
pub fn to_geo(point: SpherePoint) -> GeoPoint {
    let radius = point.length();
    if radius <= 0.0 {
        return GeoPoint::new(0.0, 0.0);
    }
    let lat = (point.y / radius).clamp(-1.0, 1.0).asin();
    let lon = point.z.atan2(point.x);
    GeoPoint::new(lat.to_degrees(), lon.to_degrees())
}

/// Project a whole ring at `altitude`
pub fn project_ring(ring: &[GeoPoint], altitude: f64) -> Vec<SpherePoint> {
    ring.iter().map(|p| project(*p, altitude)).collect()
}
