//! Default values shared across the engine.

/// HTTP defaults.
pub mod http {
    /// Connection/operation timeout applied when the caller does not set one.
    pub const TIMEOUT_SECONDS: u64 = 30;

    /// Content type installed as a client-wide default header. Per-request
    /// headers override it.
    pub const CONTENT_TYPE: &str = "application/json";
}

/// Client cache defaults.
pub mod cache {
    use std::time::Duration;

    /// Sliding expiry window for cached transport clients. Every cache hit
    /// resets the clock for that entry.
    pub const SLIDING_EXPIRY: Duration = Duration::from_secs(60 * 60);
}

/// Certificate store defaults.
pub mod certs {
    /// Environment variable that overrides the personal certificate store
    /// location.
    pub const STORE_ENV_VAR: &str = "FLOWLINK_CERT_STORE";

    /// Store directory under the user's home when the override is unset.
    pub const STORE_HOME_DIR: &str = ".flowlink/certstore";
}
