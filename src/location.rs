//! `"<latitude>, <longitude>"` location strings.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Parse a location string.
///
/// Valid iff splitting on ',' yields exactly two parts and both, trimmed,
/// parse as finite numbers. Range is not checked.
pub fn parse(location: &str) -> Option<Coordinates> {
    let mut parts = location.split(',');
    let (lat, lon) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lon), None) => (lat, lon),
        _ => return None,
    };

    let lat = parse_component(lat)?;
    let lon = parse_component(lon)?;
    Some(Coordinates { lat, lon })
}

fn parse_component(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Text written into a form's location field after a position fix
pub fn format(lat: f64, lon: f64) -> String {
    Coordinates { lat, lon }.to_string()
}
