use crate::error::ProxyError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Check that a proxy target is safe to fetch when private targets are blocked.
///
/// Accepts only `http://` and `https://` URLs whose host is a hostname or a
/// public IP literal. Hostnames are not resolved, so a name pointing at a
/// private address still passes.
///
/// # Errors
/// Returns [`ProxyError::InvalidTarget`] for unparsable URLs, non-HTTP(S)
/// schemes, and loopback, private or link-local IP literals.
pub fn validate_target_url(url: &str) -> Result<(), ProxyError> {
    let parsed =
        Url::parse(url).map_err(|_| ProxyError::InvalidTarget(format!("Invalid URL: {url}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ProxyError::InvalidTarget(format!(
                "Scheme '{scheme}' not allowed, only http/https permitted"
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| ProxyError::InvalidTarget(format!("No host in URL: {url}")))?;

    match host {
        Host::Ipv4(ip) if is_blocked_ipv4(ip) => Err(ProxyError::InvalidTarget(format!(
            "Private or reserved IPv4 address not allowed: {ip}"
        ))),
        Host::Ipv6(ip) if is_blocked_ipv6(ip) => Err(ProxyError::InvalidTarget(format!(
            "Private or reserved IPv6 address not allowed: {ip}"
        ))),
        Host::Domain(domain) if domain.eq_ignore_ascii_case("localhost") => Err(
            ProxyError::InvalidTarget("localhost not allowed".to_string()),
        ),
        _ => Ok(()),
    }
}

/// `0.0.0.0/8`, `10/8`, `127/8`, `169.254/16`, `172.16/12`, `192.168/16`
fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();

    a == 0
        || a == 10
        || a == 127
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
}

/// Loopback, `fe80::/10` link-local, `fc00::/7` unique-local, and
/// IPv4-mapped addresses in the blocked IPv4 ranges
fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_ipv4(v4);
    }

    let s = ip.segments();

    ip.is_loopback()
        || ip.is_unspecified()
        || (s[0] & 0xffc0) == 0xfe80
        || (s[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_loopback_and_private_ipv4() {
        for url in [
            "http://127.0.0.1/live.m3u8",
            "http://10.1.2.3/live.m3u8",
            "http://172.16.0.1/live.m3u8",
            "http://192.168.1.1/live.m3u8",
            "http://169.254.169.254/latest/meta-data/",
            "http://0.0.0.0/live.m3u8",
        ] {
            assert!(validate_target_url(url).is_err(), "{url} should be blocked");
        }
    }

    #[test]
    fn rejects_private_ipv6() {
        for url in [
            "http://[::1]/live.m3u8",
            "http://[::]/live.m3u8",
            "http://[fe80::1]/live.m3u8",
            "http://[fd00::1]/live.m3u8",
            "http://[::ffff:127.0.0.1]/live.m3u8",
        ] {
            assert!(validate_target_url(url).is_err(), "{url} should be blocked");
        }
    }

    #[test]
    fn rejects_localhost_name() {
        assert!(validate_target_url("http://localhost:8080/live.m3u8").is_err());
        assert!(validate_target_url("http://LOCALHOST/live.m3u8").is_err());
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_target_url("ftp://cdn.example.com/seg.ts").is_err());
        assert!(validate_target_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(validate_target_url("").is_err());
        assert!(validate_target_url("cdn.example.com/live.m3u8").is_err());
    }

    #[test]
    fn boundaries_of_172_range_allowed() {
        assert!(validate_target_url("http://172.15.255.255/s.ts").is_ok());
        assert!(validate_target_url("http://172.32.0.0/s.ts").is_ok());
    }

    #[test]
    fn allows_public_targets() {
        assert!(validate_target_url("https://cdn.example.com/live/index.m3u8?token=abc").is_ok());
        assert!(validate_target_url("http://8.8.8.8/seg.ts").is_ok());
        assert!(validate_target_url("http://[2001:db8::1]/seg.ts").is_ok());
    }
}
