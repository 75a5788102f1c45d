use std::net::SocketAddr;

/// Extract the host part of a raw peer-address string.
///
/// Bracketed IPv6 (`[::1]:80`) and single-colon forms (`1.2.3.4:80`)
/// go through socket-address parsing; a parse failure yields an empty
/// string. Inputs that are already bare hosts (plain IPv4, unbracketed
/// IPv6) pass through unchanged.
pub fn parse_ip(remote_addr: &str) -> String {
    if remote_addr.starts_with('[') || remote_addr.matches(':').count() == 1 {
        return match remote_addr.parse::<SocketAddr>() {
            Ok(addr) => addr.ip().to_string(),
            Err(_) => String::new(),
        };
    }

    remote_addr.to_string()
}
