//! Local DNS lookups.
//!
//! The resolve and reverse-DNS tools normally go through the backend,
//! which enriches results with geolocation and ISP data. With `--local`
//! they fall back to the system resolver and answer in the same shapes,
//! so they stay usable without a backend.

use crate::api::types::{HostnameToIp, ReverseDns};
use crate::error::Result;
use crate::lookup::validate;
use std::net::IpAddr;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::name_server::TokioHandle;
use trust_dns_resolver::proto::rr::RecordType;
use trust_dns_resolver::TokioAsyncResolver;

/// System-resolver backed lookups.
///
/// # Example
///
/// ```ignore
/// let resolver = LocalResolver::new()?;
/// let result = resolver.resolve("example.com").await?;
/// println!("{:?}", result.all_ips);
/// ```
pub struct LocalResolver {
    resolver: TokioAsyncResolver,
}

impl LocalResolver {
    /// Create a resolver from the system DNS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system resolver configuration cannot be
    /// read.
    pub fn new() -> Result<Self> {
        let resolver = TokioAsyncResolver::from_system_conf(TokioHandle)
            .map_err(crate::error::Error::Resolver)?;
        Ok(Self { resolver })
    }

    /// Resolve a hostname to its A and AAAA records.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a malformed hostname, or a
    /// `Resolver` error for resolution failures other than an empty
    /// answer.
    pub async fn resolve(&self, hostname: &str) -> Result<HostnameToIp> {
        let hostname = validate::validate_hostname(hostname)?;

        // A trailing dot makes the name fully qualified.
        let query = if hostname.ends_with('.') {
            hostname.to_string()
        } else {
            format!("{hostname}.")
        };

        let mut ips: Vec<IpAddr> = self.lookup_ips(&query, RecordType::A).await?;
        ips.extend(self.lookup_ips(&query, RecordType::AAAA).await?);

        let ipv4 = ips
            .iter()
            .find(|ip| ip.is_ipv4())
            .map(std::string::ToString::to_string);
        let ipv6: Vec<String> = ips
            .iter()
            .filter(|ip| ip.is_ipv6())
            .map(std::string::ToString::to_string)
            .collect();
        let all_ips: Vec<String> = ips.iter().map(std::string::ToString::to_string).collect();
        let found = !all_ips.is_empty();

        Ok(HostnameToIp {
            found,
            ipv4,
            ipv6,
            all_ips,
            message: if found {
                None
            } else {
                Some(format!("no address records for {hostname}"))
            },
        })
    }

    /// Reverse (PTR) lookup for an IP address.
    ///
    /// An empty answer is reported as `found: false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns a `Resolver` error for failures other than an empty
    /// answer.
    pub async fn reverse(&self, ip: IpAddr) -> Result<ReverseDns> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => {
                let ptr_records: Vec<String> = lookup
                    .iter()
                    .map(|name| name.to_string().trim_end_matches('.').to_string())
                    .collect();
                let hostname = ptr_records.first().cloned();
                Ok(ReverseDns {
                    found: !ptr_records.is_empty(),
                    hostname,
                    ptr_records,
                    message: None,
                })
            }
            Err(e) if is_no_records(&e) => Ok(ReverseDns {
                found: false,
                hostname: None,
                ptr_records: Vec::new(),
                message: Some(format!("no PTR record for {ip}")),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup_ips(&self, query: &str, record_type: RecordType) -> Result<Vec<IpAddr>> {
        match self.resolver.lookup(query, record_type).await {
            Ok(response) => Ok(response
                .iter()
                .filter_map(|r| {
                    if let Some(ip) = r.as_a() {
                        Some(IpAddr::V4(*ip))
                    } else if let Some(ip) = r.as_aaaa() {
                        Some(IpAddr::V6(*ip))
                    } else {
                        None
                    }
                })
                .collect()),
            Err(e) if is_no_records(&e) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_no_records(error: &ResolveError) -> bool {
    matches!(error.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a working system resolver and network; opt-in.
    #[tokio::test]
    async fn test_resolve_localhost_zone() {
        if std::env::var("IPSCOUT_E2E").is_err() {
            return;
        }

        let resolver = LocalResolver::new().unwrap();
        let result = resolver.resolve("localhost").await.unwrap();
        assert!(result.found);
    }
}
