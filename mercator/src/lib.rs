//! Spherical Web-Mercator (EPSG:3857) math.
//!
//! Geographic coordinates are `(x = longitude, y = latitude)` in degrees,
//! projected coordinates are metres on the WGS84 semi-major axis sphere.

use geo::{Coord, CoordFloat, MapCoords, Rect};
use num_traits::{Float, FloatConst};

/// WGS84 semi-major axis in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the projected square world ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

fn cast<T: Float>(v: f64) -> T {
    <T as num_traits::NumCast>::from(v).unwrap_or_else(T::nan)
}

/// Longitude (degrees) to projected x (metres).
pub fn lon_to_x<T: Float + FloatConst>(lon: T) -> T {
    cast::<T>(EARTH_RADIUS) * lon.to_radians()
}

/// Latitude (degrees) to projected y (metres). Latitudes outside
/// `±MAX_LATITUDE` are clamped.
pub fn lat_to_y<T: Float + FloatConst>(lat: T) -> T {
    let max = cast::<T>(MAX_LATITUDE);
    let lat = lat.max(-max).min(max).to_radians();
    let half = cast::<T>(0.5);
    cast::<T>(EARTH_RADIUS) * (half * (T::FRAC_PI_2() + lat)).tan().ln()
}

pub fn x_to_lon<T: Float + FloatConst>(x: T) -> T {
    (x / cast::<T>(EARTH_RADIUS)).to_degrees()
}

pub fn y_to_lat<T: Float + FloatConst>(y: T) -> T {
    let two = cast::<T>(2.0);
    (two * (y / cast::<T>(EARTH_RADIUS)).exp().atan() - T::FRAC_PI_2()).to_degrees()
}

pub fn forward<T: CoordFloat + FloatConst>(coord: Coord<T>) -> Coord<T> {
    geo::coord! { x: lon_to_x(coord.x), y: lat_to_y(coord.y) }
}

pub fn inverse<T: CoordFloat + FloatConst>(coord: Coord<T>) -> Coord<T> {
    geo::coord! { x: x_to_lon(coord.x), y: y_to_lat(coord.y) }
}

/// Reprojects every coordinate of a geographic geometry.
pub fn project<T, G>(geometry: &G) -> G::Output
where
    T: CoordFloat + FloatConst,
    G: MapCoords<T, T>,
{
    geometry.map_coords(forward)
}

pub fn unproject<T, G>(geometry: &G) -> G::Output
where
    T: CoordFloat + FloatConst,
    G: MapCoords<T, T>,
{
    geometry.map_coords(inverse)
}

/// Projects a geographic rectangle. Both projections are monotonic per axis
/// so the corners stay corners.
pub fn project_rect<T: CoordFloat + FloatConst>(rect: Rect<T>) -> Rect<T> {
    Rect::new(forward(rect.min()), forward(rect.max()))
}

pub fn unproject_rect<T: CoordFloat + FloatConst>(rect: Rect<T>) -> Rect<T> {
    Rect::new(inverse(rect.min()), inverse(rect.max()))
}

/// Axis-aligned square of half side `radius` around a projected point, the
/// bounds of a square-capped buffer.
pub fn square_around<T: CoordFloat>(center: Coord<T>, radius: T) -> Rect<T> {
    Rect::new(
        geo::coord! { x: center.x - radius, y: center.y - radius },
        geo::coord! { x: center.x + radius, y: center.y + radius },
    )
}
