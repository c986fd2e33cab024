//! Constants used throughout the kbmirror library.
//!
//! Well-known identifiers the graph store provisions, and connection defaults.

/// Default JSON endpoint of a local graph store.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8090/ws_json";

/// Keynode of the relation joining a user node to its login link.
pub const NREL_LOGIN: &str = "nrel_login";

/// Keynode of the class of user-interface users.
pub const UI_USER: &str = "ui_user";
