//! Error types and handling for the weather map

use thiserror::Error;

/// Main error type for the weather map
#[derive(Error, Debug)]
pub enum MapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network failures and non-success HTTP statuses from remote services
    #[error("API error: {message}")]
    Api { message: String },

    /// Response bodies that do not have the expected shape
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A forecast was requested for a point outside the configured region
    #[error("Point {lat}, {lon} is outside the map region")]
    OutOfRegion { lat: f64, lon: f64 },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn out_of_region(lat: f64, lon: f64) -> Self {
        Self::OutOfRegion { lat, lon }
    }

    /// Get a user-friendly error message, in the language of the page
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MapError::Config { message } => format!("Konfigurationsfehler: {message}"),
            MapError::Api { .. } => {
                "Die Wetterdaten konnten nicht geladen werden. Bitte später erneut versuchen."
                    .to_string()
            }
            MapError::Parse { .. } => {
                "Der Wetterdienst hat unerwartete Daten geliefert.".to_string()
            }
            MapError::OutOfRegion { .. } => "Bitte innerhalb Österreichs klicken.".to_string(),
            MapError::Io { .. } => "Dateizugriff fehlgeschlagen.".to_string(),
        }
    }
}

impl From<reqwest::Error> for MapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MapError::parse(err.to_string())
        } else {
            MapError::api(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for MapError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => MapError::api(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::parse(err.to_string())
    }
}
