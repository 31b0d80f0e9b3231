//! Configuration utilities (ports, static dir, env vars)

use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

/// Socket address for the page server (static assets, health check).
///
/// Reads the `PORT` env var or defaults to 3000, binds to 0.0.0.0.
pub fn page_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port_from_env("PORT", 3000)))
}

/// Socket address for the realtime (WebSocket) server.
///
/// Reads the `WS_PORT` env var or defaults to 3001.
pub fn realtime_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port_from_env("WS_PORT", 3001)))
}

fn port_from_env(var: &str, default: u16) -> u16 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(default)
}

/// Resolve the static directory served by the page server.
///
/// `STATIC_DIR` env var, falling back to `./public`.
pub fn static_dir() -> PathBuf {
    env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./public"))
}

/// Delay between client reconnect attempts. Fixed, not exponential.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Reconnect attempts before a client session gives up for good.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
