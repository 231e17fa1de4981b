use super::Vec3;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl LatLon {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

/// Project a latitude/longitude pair onto a sphere of `radius`.
///
/// Convention: +Y is the north pole and longitude 0 faces +X after the
/// 180° offset, i.e. the same layout an equirectangular day map wraps to on a
/// UV sphere.
pub fn lat_lon_to_sphere(lat_lon: LatLon, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_lon.lat_deg).to_radians();
    let theta = (lat_lon.lon_deg + 180.0).to_radians();

    Vec3::new(
        -(radius * phi.sin() * theta.cos()),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Inverse of [`lat_lon_to_sphere`]; the radius is discarded.
pub fn sphere_to_lat_lon(point: Vec3) -> Option<LatLon> {
    let r = point.length();
    if r <= 1e-12 {
        return None;
    }
    let phi = (point.y / r).clamp(-1.0, 1.0).acos();
    let theta = point.z.atan2(-point.x);
    let lat_deg = 90.0 - phi.to_degrees();
    let mut lon_deg = theta.to_degrees() - 180.0;
    if lon_deg < -180.0 {
        lon_deg += 360.0;
    }
    Some(LatLon::new(lat_deg, lon_deg))
}
