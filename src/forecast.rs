//! Forecast overlay: the popup layer fed by map clicks and search selections
//!
//! Every request draws a token from a monotonically increasing sequence. A
//! finished request only opens its popup if the same page issued no newer
//! request in the meantime, so rapid clicking never leaves a stale forecast
//! on the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::LatLng;

/// Where a forecast request came from. Decides the wording of the rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    #[default]
    Click,
    Search,
}

impl Interaction {
    /// Alert shown when the interaction targets a point outside the region
    #[must_use]
    pub fn out_of_region_message(self) -> &'static str {
        match self {
            Interaction::Click => "Bitte innerhalb Österreichs klicken.",
            Interaction::Search => "Bitte innerhalb Österreichs suchen.",
        }
    }
}

/// Rendered forecast anchored at the requested point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub token: u64,
    pub position: LatLng,
    pub html: String,
    pub request_url: String,
}

/// Result of a forecast request that passed the region gate
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// The popup is now the one shown on the forecast layer
    Shown(Popup),
    /// A newer request was issued while this one was in flight
    Superseded { token: u64 },
}

/// Client id used when a request does not name one
pub const DEFAULT_CLIENT: &str = "default";

/// Number of pages whose popup state is kept; the least recently active
/// page is dropped first.
const MAX_CLIENTS: usize = 256;

#[derive(Debug, Default)]
struct ClientLayer {
    issued: u64,
    shown: Option<Popup>,
}

/// Forecast popups of every open page. Each page is a client with its own
/// latest request, so one page never supersedes another.
#[derive(Debug)]
pub struct ForecastOverlay {
    sequence: AtomicU64,
    clients: Mutex<HashMap<String, ClientLayer>>,
    max_clients: usize,
}

impl Default for ForecastOverlay {
    fn default() -> Self {
        Self::with_capacity(MAX_CLIENTS)
    }
}

impl ForecastOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(max_clients: usize) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            clients: Mutex::new(HashMap::new()),
            max_clients: max_clients.max(1),
        }
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<String, ClientLayer>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw the token for a new request of `client`
    pub fn issue(&self, client: &str) -> u64 {
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut clients = self.clients();
        clients.entry(client.to_string()).or_default().issued = token;

        if clients.len() > self.max_clients {
            let idle = clients
                .iter()
                .min_by_key(|(_, layer)| layer.issued)
                .map(|(id, _)| id.clone());
            if let Some(idle) = idle {
                debug!(client = %idle, "dropping idle forecast client");
                clients.remove(&idle);
            }
        }
        token
    }

    /// True while `client` issued no request newer than `token`
    #[must_use]
    pub fn is_current(&self, client: &str, token: u64) -> bool {
        self.clients()
            .get(client)
            .is_some_and(|layer| layer.issued == token)
    }

    /// Replace the popup shown to `client`, unless the popup belongs to a
    /// superseded request.
    pub fn open(&self, client: &str, popup: Popup) -> ForecastOutcome {
        let mut clients = self.clients();
        let Some(layer) = clients.get_mut(client) else {
            return ForecastOutcome::Superseded { token: popup.token };
        };

        let older_than_shown = layer.shown.as_ref().is_some_and(|p| p.token > popup.token);
        if layer.issued != popup.token || older_than_shown {
            debug!(client, token = popup.token, "discarding stale forecast");
            return ForecastOutcome::Superseded { token: popup.token };
        }

        layer.shown = Some(popup.clone());
        ForecastOutcome::Shown(popup)
    }

    /// Popup currently shown to `client`
    #[must_use]
    pub fn current(&self, client: &str) -> Option<Popup> {
        self.clients()
            .get(client)
            .and_then(|layer| layer.shown.clone())
    }
}
