//! View models for the backend API.
//!
//! Each lookup tool holds one of these for the lifetime of a single
//! query; a new query replaces the previous result entirely. Nothing
//! here is persisted.

use serde::{Deserialize, Serialize};

/// Information about the caller's own IP address.
///
/// Returned by `GET /api/my-ip`. The IPv6-specific fields are filled in
/// by [`IpInfo::merge`] from the secondary `GET /api/ipv6-check` probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IpInfo {
    pub ip: String,
    /// Address family of `ip`, e.g. "IPv4" or "IPv6"
    pub version: String,
    pub country: String,
    pub city: String,
    pub region: Option<String>,
    pub isp: String,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub timezone: Option<String>,
    /// "lat,lon" string as reported by the backend
    pub coordinates: Option<String>,
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
}

impl IpInfo {
    /// Fold the IPv6 connectivity probe into this view model.
    ///
    /// The secondary probe supplements the base data rather than
    /// replacing it; merging the same probe twice yields an identical
    /// value.
    pub fn merge(&mut self, check: &Ipv6Check) {
        if check.ipv4_address.is_some() {
            self.ipv4_address = check.ipv4_address.clone();
        }
        if check.ipv6_address.is_some() {
            self.ipv6_address = check.ipv6_address.clone();
        }
    }

    /// Whether the connection has working IPv6.
    #[must_use]
    pub fn has_ipv6(&self) -> bool {
        self.ipv6_address.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// IPv6 connectivity probe, `GET /api/ipv6-check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Ipv6Check {
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
}

/// Cloud provider attribution shared by the ISP and hosting lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudInfo {
    pub is_cloud: bool,
    pub provider: Option<String>,
}

/// ISP lookup result, `POST /api/isp-lookup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IspLookup {
    pub isp: String,
    pub organization: String,
    pub asn: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub postal: String,
    pub timezone: String,
    pub hostname: String,
    pub is_hosting: bool,
    pub is_datacenter: bool,
    pub cloud: CloudInfo,
    pub source: String,
}

/// ASN lookup result, `POST /api/asn-lookup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AsnLookup {
    pub asn: String,
    pub name: String,
    pub organization: String,
    pub country: String,
    pub registry: Option<String>,
    pub prefix: Option<String>,
    pub source: String,
}

/// Organization details in a hosting lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Geographic details in a hosting lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationInfo {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// Hosting/datacenter check result, `POST /api/hosting-check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingCheck {
    pub is_hosting: bool,
    pub is_datacenter: bool,
    pub hosting_type: Option<String>,
    pub cloud: CloudInfo,
    pub organization: String,
    pub asn: String,
    pub hostname: String,
    pub company: CompanyInfo,
    pub location: LocationInfo,
    pub source: String,
}

/// Proxy detection verdict within a proxy check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySignal {
    pub detected: bool,
    pub status: String,
}

/// VPN detection verdict within a proxy check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VpnSignal {
    pub detected: bool,
    pub status: String,
    pub confidence: Option<String>,
}

/// Hosting detection verdict within a proxy check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingSignal {
    pub detected: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Proxy/VPN check result, `POST /api/proxy-check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyCheck {
    pub proxy: ProxySignal,
    pub vpn: VpnSignal,
    pub hosting: HostingSignal,
    pub risk_level: RiskLevel,
    pub country: String,
    pub isocode: String,
    pub provider: String,
    pub asn: String,
    pub source: String,
}

/// Reverse DNS result, `POST /api/reverse-dns`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseDns {
    pub found: bool,
    pub hostname: Option<String>,
    pub ptr_records: Vec<String>,
    pub message: Option<String>,
}

/// Hostname resolution result, `POST /api/hostname-to-ip`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostnameToIp {
    pub found: bool,
    pub ipv4: Option<String>,
    pub ipv6: Vec<String>,
    pub all_ips: Vec<String>,
    pub message: Option<String>,
}

/// One DNS server observed during a leak test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsServerDetail {
    pub ip: String,
    pub hostname: Option<String>,
    pub isp: Option<String>,
    pub country: Option<String>,
}

/// Server-side leak risk classification.
///
/// The client only maps this to a label and color; the classification
/// itself is produced by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether remediation guidance should be shown.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        !matches!(self, Self::Low)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// DNS leak test result, `GET /api/dns-leak-test`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsLeakTest {
    pub client_ip: String,
    pub client_country: Option<String>,
    pub client_isp: Option<String>,
    pub dns_servers: Vec<String>,
    pub dns_details: Vec<DnsServerDetail>,
    pub leak_detected: bool,
    pub risk_level: RiskLevel,
    pub message: String,
    pub note: String,
}

/// One relay hop extracted from an email header trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailHop {
    pub hop: u32,
    pub ip: Option<String>,
    pub host: Option<String>,
    pub by: Option<String>,
    pub timestamp: Option<String>,
}

/// Email header trace result, `POST /api/email-trace`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailTrace {
    pub found: bool,
    pub origin_ip: Option<String>,
    pub origin_country: Option<String>,
    pub origin_isp: Option<String>,
    pub hops: Vec<EmailHop>,
    pub message: Option<String>,
}

/// Request body for the IP-accepting tools.
#[derive(Debug, Clone, Serialize)]
pub struct IpQuery {
    pub ip: String,
}

/// Request body for the hostname resolution tool.
#[derive(Debug, Clone, Serialize)]
pub struct HostnameQuery {
    pub hostname: String,
}

/// Request body for the email header trace tool.
#[derive(Debug, Clone, Serialize)]
pub struct HeadersQuery {
    pub headers: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ip_info() -> IpInfo {
        IpInfo {
            ip: "1.2.3.4".to_string(),
            version: "IPv4".to_string(),
            country: "Germany".to_string(),
            city: "Berlin".to_string(),
            isp: "Example ISP".to_string(),
            ..IpInfo::default()
        }
    }

    #[test]
    fn test_merge_supplements_addresses() {
        let mut info = base_ip_info();
        let check = Ipv6Check {
            ipv4_address: Some("1.2.3.4".to_string()),
            ipv6_address: Some("::1".to_string()),
        };

        info.merge(&check);

        assert_eq!(info.ip, "1.2.3.4");
        assert_eq!(info.country, "Germany");
        assert_eq!(info.ipv4_address.as_deref(), Some("1.2.3.4"));
        assert_eq!(info.ipv6_address.as_deref(), Some("::1"));
        assert!(info.has_ipv6());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let check = Ipv6Check {
            ipv4_address: Some("1.2.3.4".to_string()),
            ipv6_address: Some("::1".to_string()),
        };

        let mut once = base_ip_info();
        once.merge(&check);

        let mut twice = base_ip_info();
        twice.merge(&check);
        twice.merge(&check);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_with_empty_probe_keeps_base() {
        let mut info = base_ip_info();
        info.ipv4_address = Some("1.2.3.4".to_string());
        info.merge(&Ipv6Check::default());
        assert_eq!(info.ipv4_address.as_deref(), Some("1.2.3.4"));
        assert!(!info.has_ipv6());
    }

    #[test]
    fn test_risk_level_parsing() {
        let leak: DnsLeakTest = serde_json::from_str(
            r#"{"client_ip": "1.2.3.4", "risk_level": "high", "leak_detected": true}"#,
        )
        .unwrap();
        assert_eq!(leak.risk_level, RiskLevel::High);
        assert!(leak.risk_level.needs_attention());

        let leak: DnsLeakTest =
            serde_json::from_str(r#"{"client_ip": "1.2.3.4", "risk_level": "severe"}"#).unwrap();
        assert_eq!(leak.risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn test_proxy_check_parsing() {
        let json = r#"{
            "proxy": {"detected": false, "status": "clean"},
            "vpn": {"detected": true, "status": "vpn exit", "confidence": "high"},
            "hosting": {"detected": true, "type": "datacenter"},
            "risk_level": "medium",
            "country": "Netherlands",
            "isocode": "NL",
            "provider": "Example Hosting BV",
            "asn": "AS64496",
            "source": "composite"
        }"#;
        let check: ProxyCheck = serde_json::from_str(json).unwrap();
        assert!(!check.proxy.detected);
        assert!(check.vpn.detected);
        assert_eq!(check.hosting.kind.as_deref(), Some("datacenter"));
        assert_eq!(check.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let info: IpInfo = serde_json::from_str(
            r#"{"ip": "8.8.8.8", "version": "IPv4", "flag_emoji": "🇺🇸"}"#,
        )
        .unwrap();
        assert_eq!(info.ip, "8.8.8.8");
    }

    #[test]
    fn test_missing_fields_default() {
        let result: HostnameToIp = serde_json::from_str(r#"{"found": true}"#).unwrap();
        assert!(result.found);
        assert!(result.ipv4.is_none());
        assert!(result.all_ips.is_empty());
    }
}
