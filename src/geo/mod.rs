/// Mean Earth radius, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Point above a spherical planet. Angles are kept in radians, altitude in km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl Position {
    pub fn from_degrees(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude: latitude.to_radians(),
            longitude: longitude.to_radians(),
            altitude,
        }
    }

    /// A point on the surface (altitude 0).
    pub fn surface(latitude: f64, longitude: f64) -> Self {
        Self::from_degrees(latitude, longitude, 0.0)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// Distance from the planet center, km.
    pub fn radius(&self) -> f64 {
        EARTH_RADIUS_KM + self.altitude
    }
}

/// Angle at the planet center between two points (haversine form), radians.
pub fn central_angle(a: Position, b: Position) -> f64 {
    let dlat = b.latitude - a.latitude;
    let dlon = b.longitude - a.longitude;

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.cos() * b.latitude.cos() * (dlon / 2.0).sin().powi(2);

    // h can overshoot 1.0 by an ulp for antipodal points
    2.0 * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Great-circle distance between the ground projections of two points, km.
pub fn surface_distance(a: Position, b: Position) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_KM
}

/// Straight-line distance through space, km.
pub fn chord_distance(a: Position, b: Position) -> f64 {
    let ra = a.radius();
    let rb = b.radius();
    let angle = central_angle(a, b);

    let sq = ra * ra + rb * rb - 2.0 * ra * rb * angle.cos();
    sq.max(0.0).sqrt()
}

/// Straight-line distance from `p` to the point where its line of sight grazes the surface, km.
pub fn horizon_distance(p: Position) -> f64 {
    let alt = p.altitude.max(0.0);
    (alt * (2.0 * EARTH_RADIUS_KM + alt)).sqrt()
}

/// Two points see each other when their surface separation is shorter than
/// the sum of their horizon reaches.
pub fn can_connect(a: Position, b: Position) -> bool {
    surface_distance(a, b) < horizon_distance(a) + horizon_distance(b)
}
