//! URL validation for SSRF protection.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use log::debug;
use url::{Host, Url};

use crate::error::ExtractError;

/// A URL that passed validation, together with the address the connection
/// must be pinned to.
///
/// The address is resolved exactly once, at validation time. Connecting to
/// `addr` while keeping the original hostname in the URL closes the window
/// for DNS rebinding between the check and the request.
#[derive(Debug, Clone)]
pub struct SafeTarget {
    /// The parsed URL, hostname intact (TLS verification and the Host
    /// header stay correct)
    pub url: Url,
    /// Hostname as it appears in the URL
    pub host: String,
    /// The validated address the request must connect to
    pub addr: SocketAddr,
}

/// URL validator for SSRF protection.
///
/// Validates URLs before fetching to prevent:
/// - Access to internal services (localhost, 127.0.0.1)
/// - Access to private IP ranges (10.x, 172.16.x, 192.168.x)
/// - Access to cloud metadata services (169.254.x)
/// - Non-HTTP(S) schemes (file://, ftp://)
#[derive(Debug, Clone)]
pub struct UrlGuard {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<ipnet::IpNet>,
    allowed_hosts: HashSet<String>,
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlGuard {
    /// Create a new URL validator with default security rules.
    pub fn new() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: [
                "localhost",
                "127.0.0.1",
                "::1",
                "[::1]",
                "0.0.0.0",
                "metadata.google.internal",
                "instance-data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blocked_cidrs: vec![
                "10.0.0.0/8".parse().unwrap(),
                "172.16.0.0/12".parse().unwrap(),
                "192.168.0.0/16".parse().unwrap(),
                "169.254.0.0/16".parse().unwrap(), // Link-local / cloud metadata
                "127.0.0.0/8".parse().unwrap(),    // Loopback
                "0.0.0.0/8".parse().unwrap(),      // Unspecified
                "100.64.0.0/10".parse().unwrap(),  // CGNAT
                "198.18.0.0/15".parse().unwrap(),  // Benchmarking
                "224.0.0.0/4".parse().unwrap(),    // Multicast
                "240.0.0.0/4".parse().unwrap(),    // Reserved
                "::1/128".parse().unwrap(),        // IPv6 loopback
                "::/128".parse().unwrap(),         // IPv6 unspecified
                "fc00::/7".parse().unwrap(),       // IPv6 private
                "fe80::/10".parse().unwrap(),      // IPv6 link-local
            ],
            allowed_hosts: HashSet::new(),
        }
    }

    /// Add an allowed host (bypasses the blocklists, not the scheme check).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into());
        self
    }

    /// Block an additional host.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into());
        self
    }

    /// Syntactic validation: scheme, host blocklist, and literal-IP ranges.
    ///
    /// Does not touch the network. Hostnames that need DNS resolution pass
    /// here and are settled by [`UrlGuard::resolve`].
    pub fn check(&self, raw: &str) -> Result<Url, ExtractError> {
        let parsed = Url::parse(raw)
            .map_err(|e| ExtractError::UnsafeUrl(format!("invalid URL: {e}")))?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(ExtractError::UnsafeUrl(format!(
                "scheme '{}' is not allowed",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ExtractError::UnsafeUrl("URL has no host".to_string()))?;

        // Allowed hosts bypass the blocklists
        if self.allowed_hosts.contains(host) {
            return Ok(parsed);
        }

        if self.blocked_hosts.contains(host) {
            return Err(ExtractError::UnsafeUrl(format!("host '{host}' is blocked")));
        }

        // Literal IPs are checked against the CIDR list right away
        if let Some(ip) = literal_ip(&parsed) {
            self.check_ip(&ip, host)?;
        }

        Ok(parsed)
    }

    /// Full validation: [`UrlGuard::check`] plus a single DNS resolution,
    /// with every resolved address checked against the blocked ranges.
    ///
    /// Returns the target with the first resolved address, which the fetcher
    /// pins its connection to. This catches DNS rebinding attacks where a
    /// hostname resolves to an internal IP.
    pub async fn resolve(&self, raw: &str) -> Result<SafeTarget, ExtractError> {
        let parsed = self.check(raw)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ExtractError::UnsafeUrl("URL has no host".to_string()))?
            .to_string();
        let port = parsed.port_or_known_default().unwrap_or(443);

        // Literal IPs skip DNS; the address is the host itself
        if let Some(ip) = literal_ip(&parsed) {
            return Ok(SafeTarget {
                addr: SocketAddr::new(ip, port),
                url: parsed,
                host,
            });
        }

        let allowed = self.allowed_hosts.contains(host.as_str());

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(format!("{host}:{port}"))
            .await
            .map_err(|e| {
                ExtractError::UnsafeUrl(format!("could not resolve hostname '{host}': {e}"))
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ExtractError::UnsafeUrl(format!(
                "DNS returned no addresses for '{host}'"
            )));
        }

        if !allowed {
            for addr in &addrs {
                self.check_ip(&addr.ip(), &host)?;
            }
        }

        debug!("resolved {} to {} (pinned)", host, addrs[0]);
        Ok(SafeTarget {
            addr: addrs[0],
            url: parsed,
            host,
        })
    }

    fn check_ip(&self, ip: &IpAddr, host: &str) -> Result<(), ExtractError> {
        for cidr in &self.blocked_cidrs {
            if cidr.contains(ip) {
                return Err(ExtractError::UnsafeUrl(format!(
                    "'{host}' resolves to blocked address {ip}"
                )));
            }
        }
        Ok(())
    }
}

/// The host portion of the URL when it is an IP literal.
fn literal_ip(url: &Url) -> Option<IpAddr> {
    match url.host()? {
        Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
        Host::Ipv6(ip) => Some(IpAddr::V6(ip)),
        Host::Domain(_) => None,
    }
}
