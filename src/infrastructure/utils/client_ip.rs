use std::net::IpAddr;

use actix_web::HttpRequest;

/// Network origin of a request, used as a rate-limit identity when the
/// deployment keys on client address.
///
/// Forwarding headers are only honoured when `trust_forwarded` is set, since
/// any client can send them.
pub fn client_ip(req: &HttpRequest, trust_forwarded: bool) -> Option<String> {
    if trust_forwarded {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .or_else(|| {
                req.headers()
                    .get("x-real-ip")
                    .and_then(|value| value.to_str().ok())
            })
            .and_then(|value| value.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    req.peer_addr().map(|addr| addr.ip().to_string())
}
