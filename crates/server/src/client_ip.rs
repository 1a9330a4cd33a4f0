//! Client address resolution.
//!
//! The transport peer is trusted unless it is loopback, in which case the
//! request is assumed to come through a local reverse proxy and the first
//! `X-Forwarded-For` entry is used instead. Anyone who can reach the server
//! through that proxy controls the header, so the result identifies a client
//! only as far as the proxy is trusted. Vote limits keyed on it are advisory.

use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::error::AppError;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";

/// Picks the client address from the peer and the raw `X-Forwarded-For` value.
///
/// Returns `None` when there is no usable address: no peer and no non-blank
/// header, or a header whose first entry is not an IP address.
pub fn resolve(peer: Option<IpAddr>, forwarded_for: Option<&str>) -> Option<IpAddr> {
    let peer = peer.map(|ip| ip.to_canonical());
    // a blank header carries no client and is treated as absent
    let forwarded_for = forwarded_for.map(str::trim).filter(|h| !h.is_empty());
    match (peer, forwarded_for) {
        (Some(ip), _) if !ip.is_loopback() => Some(ip),
        (_, Some(header)) => first_forwarded(header),
        (peer, None) => peer,
    }
}

fn first_forwarded(header: &str) -> Option<IpAddr> {
    let entry = header.split(',').next()?.trim();
    parse_entry(entry).map(|ip| ip.to_canonical())
}

/// Accepts a bare address, `addr:port`, `[v6]:port` or `[v6]`.
fn parse_entry(entry: &str) -> Option<IpAddr> {
    if let Ok(ip) = entry.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(sock) = entry.parse::<SocketAddr>() {
        return Some(sock.ip());
    }
    entry
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|inner| inner.parse().ok())
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Resolved client address. Rejects with 400 when nothing usable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        resolve(peer, header_str(&parts.headers, FORWARDED_FOR))
            .map(ClientIp)
            .ok_or_else(AppError::unresolved_ip)
    }
}
