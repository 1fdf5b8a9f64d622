use std::net::{IpAddr, SocketAddr};

use actix_web::dev::ServiceRequest;

/// Where the per-client rate-limit key comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientKeySource {
    /// The TCP peer address only. Client headers cannot move a caller to a
    /// fresh budget.
    #[default]
    Peer,
    /// `Forwarded` / `X-Forwarded-For` aware client address. Only sound
    /// behind a proxy that overwrites those headers.
    RealIp,
}

impl ClientKeySource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "real_ip" | "real-ip" | "realip" => Some(Self::RealIp),
            "peer" | "peer_ip" => Some(Self::Peer),
            _ => None,
        }
    }
}

/// Key shared by requests with no resolvable address.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub fn client_key(req: &ServiceRequest, source: ClientKeySource) -> String {
    let resolved = match source {
        ClientKeySource::RealIp => req
            .connection_info()
            .realip_remote_addr()
            .map(normalize_addr),
        ClientKeySource::Peer => req.peer_addr().map(|addr| addr.ip().to_string()),
    };
    resolved.unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Strips ports and IPv6 brackets so one client maps to one key.
fn normalize_addr(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    let unbracketed = raw.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return ip.to_string();
    }
    raw.to_string()
}
