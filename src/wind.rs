//! Wind overlay: the velocity layer and its "as of" caption
//!
//! The field is loaded once at startup and kept for the lifetime of the
//! process. Readers that arrive while the load is in flight wait for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::WindField;

/// Fixed display options handed to the velocity layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityDisplayOptions {
    pub direction_string: String,
    pub speed_string: String,
    pub speed_unit: String,
    pub position: String,
    pub velocity_type: String,
    pub line_width: u8,
}

impl Default for VelocityDisplayOptions {
    fn default() -> Self {
        Self {
            direction_string: "Windrichtung".to_string(),
            speed_string: "Windgeschwindigkeit".to_string(),
            speed_unit: "km/h".to_string(),
            position: "bottomright".to_string(),
            velocity_type: String::new(),
            line_width: 2,
        }
    }
}

/// A wind field ready to be drawn
#[derive(Debug, Clone, Serialize)]
pub struct LoadedWind {
    pub data: WindField,
    pub display_options: VelocityDisplayOptions,
    pub source_url: String,
    pub valid_time: DateTime<Utc>,
    /// Content of the `#forecast-date` element
    pub caption_html: String,
}

/// Where the wind layer stands. Readers wait while a load is in flight.
#[derive(Debug, Clone, Default)]
pub enum WindState {
    #[default]
    NotRequested,
    Loading,
    Loaded(Box<LoadedWind>),
    /// User-facing reason the load failed
    Failed(String),
}

#[derive(Debug)]
pub struct WindOverlay {
    state: watch::Sender<WindState>,
}

impl Default for WindOverlay {
    fn default() -> Self {
        let (state, _) = watch::channel(WindState::NotRequested);
        Self { state }
    }
}

impl WindOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_loading(&self) {
        self.state.send_replace(WindState::Loading);
    }

    pub fn set(&self, wind: LoadedWind) {
        self.state.send_replace(WindState::Loaded(Box::new(wind)));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.state.send_replace(WindState::Failed(message.into()));
    }

    /// Current state once no load is in flight
    pub async fn settled(&self) -> WindState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| !matches!(state, WindState::Loading)).await {
            Ok(state) => (*state).clone(),
            // the sender lives in `self`, so the channel cannot close here
            Err(_) => self.state.borrow().clone(),
        }
    }

    pub async fn get(&self) -> Option<LoadedWind> {
        match self.settled().await {
            WindState::Loaded(wind) => Some(*wind),
            _ => None,
        }
    }

    pub async fn caption(&self) -> Option<String> {
        self.get().await.map(|wind| wind.caption_html)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.borrow(), WindState::Loaded(_))
    }
}
