//! Parks layer: one marker with popup per configured point of interest

use serde::{Deserialize, Serialize};

use crate::models::{LatLng, PointOfInterest};
use crate::render::park_popup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub position: LatLng,
    pub popup_html: String,
}

/// Render every park into a marker. Pure, never fails.
#[must_use]
pub fn render_parks(parks: &[PointOfInterest]) -> Vec<Marker> {
    parks
        .iter()
        .map(|park| Marker {
            name: park.name.clone(),
            position: park.position(),
            popup_html: park_popup(park).into_string(),
        })
        .collect()
}
