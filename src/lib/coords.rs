use serde_derive::{Deserialize, Serialize};

/// A position on the globe in decimal degrees.
///
/// Values are taken as reported by the platform and never range checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Serialize into the JSON body posted to the destination.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Move by the given delta in degrees.
    pub fn offset(&self, d_latitude: f64, d_longitude: f64) -> Self {
        Self::new(self.latitude + d_latitude, self.longitude + d_longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[test]
fn test_json_body_has_exactly_two_fields() {
    let json = Coordinates::new(55.75, 37.62).to_json().unwrap();
    assert_eq!(json, r#"{"latitude":55.75,"longitude":37.62}"#);
}

#[test]
fn test_out_of_range_values_are_kept() {
    let coords = Coordinates::new(123.0, -400.5);
    let json = coords.to_json().unwrap();
    let back: Coordinates = serde_json::from_str(&json).unwrap();
    assert_eq!(back, coords);
}
