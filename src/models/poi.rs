//! Static point of interest shown on the parks layer

use serde::{Deserialize, Serialize};

use super::LatLng;

/// A national park (or any other marker) with an optional photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Image URL shown in the popup
    #[serde(default)]
    pub image: Option<String>,
    /// Credit line for the image, may contain a link target
    #[serde(default)]
    pub attribution: Option<PoiAttribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiAttribution {
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl PointOfInterest {
    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}
