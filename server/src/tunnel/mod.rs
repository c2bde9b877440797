//! Authenticating SSH tunnel: the server that fronts the authority and the
//! client that nodes, proxies and web handlers dial it with.

pub mod agent;
pub mod client;
pub mod credentials;
pub mod server;

/// Subsystem name of the web-session agent channel
pub const CHAN_WEB_SESSION_AGENT: &str = "web-session-agent@teleport";
/// Subsystem name of the provisioning channel
pub const CHAN_PROVISION: &str = "provision@teleport";
/// Subsystem name of the trusted-authority registration channel
pub const CHAN_NEW_AUTH: &str = "new-auth@teleport";

// vim: ts=4
