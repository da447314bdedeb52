//! Error types and handling for `SkiScout`

use thiserror::Error;

/// Main error type for the `SkiScout` application
#[derive(Error, Debug)]
pub enum SkiScoutError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The geocoder could not place the user's location
    #[error("Location not recognized: {query}")]
    LocationNotFound { query: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl SkiScoutError {
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

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkiScoutError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SkiScoutError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            SkiScoutError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SkiScoutError::LocationNotFound { query } => {
                format!("Location not recognized: '{query}'. Try a city, region or \"lat,lon\".")
            }
            SkiScoutError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            SkiScoutError::General { message } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for SkiScoutError {
    fn from(err: reqwest::Error) -> Self {
        SkiScoutError::api(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for SkiScoutError {
    fn from(err: reqwest_middleware::Error) -> Self {
        SkiScoutError::api(err.to_string())
    }
}
