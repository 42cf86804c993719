//! Developer-time connectivity checks: which host/port combinations answer,
//! and which address a physical device should use to reach this machine.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use crate::candidates::BackendEndpoint;
use crate::probe::Probe;
use crate::Result;

pub const DEFAULT_PORTS: [u16; 3] = [4000, 3000, 8000];

pub const DIAG_HOSTS: [&str; 8] = [
    "127.0.0.1",
    "localhost",
    "10.0.2.2",
    "192.168.1.2",
    "192.168.1.3",
    "192.168.0.1",
    "192.168.43.1",
    "172.20.10.1",
];

/// Used when no external interface can be found.
pub const FALLBACK_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub url: String,
    pub reachable: bool,
}

/// Outbound IPv4 address of this host. Connecting a UDP socket sends no
/// packet; it only makes the OS pick a route and a source address.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// Known hosts plus `extra`, without duplicates, in order.
pub fn hosts_with(extra: &[String]) -> Vec<String> {
    let mut hosts: Vec<String> = DIAG_HOSTS.iter().map(|h| h.to_string()).collect();
    for h in extra {
        if !hosts.contains(h) {
            hosts.push(h.clone());
        }
    }
    hosts
}

/// Probe every host × port pair, one at a time.
pub async fn scan<P: Probe + ?Sized>(probe: &P, hosts: &[String], ports: &[u16]) -> Vec<ProbeReport> {
    let mut reports = Vec::with_capacity(hosts.len() * ports.len());
    for host in hosts {
        for port in ports {
            let raw = format!("http://{}:{}", host, port);
            let reachable = match BackendEndpoint::parse(&raw) {
                Ok(endpoint) => probe.probe(&endpoint).await,
                Err(e) => {
                    log::warn!("Skipping {}: {}", raw, e);
                    false
                }
            };
            log::debug!("{} reachable={}", raw, reachable);
            reports.push(ProbeReport { url: raw, reachable });
        }
    }
    reports
}

/// Point the configured default backend at `ip` on the standard port.
pub fn write_discovered(ip: Ipv4Addr) -> Result<String> {
    let url = format!("http://{}:{}", ip, crate::config::DEFAULT_BACKEND_PORT);
    crate::config::set_backend_url(&url)?;
    log::info!("Updated configured backend URL to {}", url);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct PortProbe(u16);

    #[async_trait]
    impl Probe for PortProbe {
        async fn probe(&self, endpoint: &BackendEndpoint) -> bool {
            endpoint.as_str().ends_with(&format!(":{}", self.0))
        }
    }

    #[tokio::test]
    async fn scan_covers_every_pair_in_order() {
        let hosts = vec!["127.0.0.1".to_string(), "10.0.2.2".to_string()];
        let reports = scan(&PortProbe(3000), &hosts, &DEFAULT_PORTS).await;
        assert_eq!(reports.len(), 6);
        assert_eq!(reports[0].url, "http://127.0.0.1:4000");
        assert_eq!(reports[4].url, "http://10.0.2.2:3000");
        let up: Vec<_> = reports.iter().filter(|r| r.reachable).map(|r| r.url.as_str()).collect();
        assert_eq!(up, vec!["http://127.0.0.1:3000", "http://10.0.2.2:3000"]);
    }

    #[test]
    fn extra_hosts_are_appended_once() {
        let hosts = hosts_with(&["10.1.2.3".to_string(), "localhost".to_string()]);
        assert_eq!(hosts.len(), DIAG_HOSTS.len() + 1);
        assert_eq!(hosts.last().map(String::as_str), Some("10.1.2.3"));
    }

    #[test]
    fn local_ipv4_is_never_loopback() {
        if let Some(ip) = local_ipv4() {
            assert!(!ip.is_loopback());
        }
    }
}
