use glam::DVec3;

/// Earth's mean angular velocity in rad/s
pub const EARTH_ANGULAR_VELOCITY: f64 = 7.2921159e-5;

/// WGS84 equatorial radius in meters
pub const EARTH_EQUATORIAL_RADIUS_M: f64 = 6_378_137.0;

/// Meters per second to miles per hour
pub const MPS_TO_MPH: f64 = 2.23694;

/// Normalize longitude from [-180, 180] to [0, 360) for grid indexing
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0)
}

/// Normalize latitude from [-90, 90] to [0, 180) for grid indexing
#[inline(always)]
pub fn normalize_lat(lat: f64) -> f64 {
    (lat + 90.0).clamp(0.0, 179.999)
}

/// Round to a fixed number of decimal places.
#[inline(always)]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Convert lon/lat (degrees) to a unit sphere vector.
#[inline(always)]
pub fn to_cartesian(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

/// The direction the globe currently presents to the viewer.
#[inline(always)]
pub fn view_direction(spin_longitude: f64, pitch: f64) -> DVec3 {
    to_cartesian(-spin_longitude, -pitch)
}

/// Exact half-space test against the view direction.
/// Points on the terminator (dot product of exactly zero) are hidden.
#[inline(always)]
pub fn is_front_facing(lon: f64, lat: f64, spin_longitude: f64, pitch: f64) -> bool {
    to_cartesian(lon, lat).dot(view_direction(spin_longitude, pitch)) > 0.0
}

/// Surface speed due to Earth's rotation at a latitude, in mph rounded to 2 decimals.
pub fn speed_at_latitude(lat: f64) -> f64 {
    let meters_per_second =
        EARTH_ANGULAR_VELOCITY * EARTH_EQUATORIAL_RADIUS_M * lat.to_radians().cos();
    round_to(meters_per_second * MPS_TO_MPH, 2)
}

/// Format a latitude/longitude pair for display.
pub fn format_coords(lon: f64, lat: f64) -> String {
    format!(
        "{:.1}°{}, {:.1}°{}",
        lat.abs(),
        if lat >= 0.0 { "N" } else { "S" },
        lon.abs(),
        if lon >= 0.0 { "E" } else { "W" }
    )
}
