use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Labdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "labdesk=info,tower_http=warn".to_string()
}

/// Get the application data directory
/// ~/Labdesk/ on all platforms (user-visible, lives next to the reports folder)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Labdesk")
}

/// Path of the SQLite database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("labdesk.db")
}

/// Listen address, overridable via LABDESK_ADDR
pub fn bind_addr() -> SocketAddr {
    std::env::var("LABDESK_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8420)))
}
