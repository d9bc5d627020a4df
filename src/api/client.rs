//! HTTP client for the lookup backend.
//!
//! A single `ApiClient` is constructed from the resolved [`Config`] and
//! shared by every tool, so the base URL is read exactly once. Non-2xx
//! replies carry a FastAPI-style `{"detail": {"message": ...}}` body
//! which is surfaced verbatim as the user-visible error.

use crate::api::types::{
    AsnLookup, DnsLeakTest, EmailTrace, HeadersQuery, HostingCheck, HostnameQuery, HostnameToIp,
    IpInfo, IpQuery, Ipv6Check, IspLookup, ProxyCheck, ReverseDns,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lookup::validate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const MY_IP: &str = "/api/my-ip";
const IPV6_CHECK: &str = "/api/ipv6-check";
const ISP_LOOKUP: &str = "/api/isp-lookup";
const ASN_LOOKUP: &str = "/api/asn-lookup";
const HOSTING_CHECK: &str = "/api/hosting-check";
const PROXY_CHECK: &str = "/api/proxy-check";
const REVERSE_DNS: &str = "/api/reverse-dns";
const HOSTNAME_TO_IP: &str = "/api/hostname-to-ip";
const DNS_LEAK_TEST: &str = "/api/dns-leak-test";
const SPEED_PING: &str = "/api/speed-test/ping";
const SPEED_DOWNLOAD: &str = "/api/speed-test/download";
const SPEED_UPLOAD: &str = "/api/speed-test/upload";
const EMAIL_TRACE: &str = "/api/email-trace";

/// Client for the lookup backend API.
///
/// Cheap to clone; the underlying connection pool is shared.
///
/// # Example
///
/// ```ignore
/// let config = Config::load(None)?;
/// let client = ApiClient::new(&config)?;
/// let info = client.my_ip_full().await?;
/// println!("{} ({})", info.ip, info.isp);
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
}

impl ApiClient {
    /// Build a client from the resolved configuration.
    ///
    /// Only a connect timeout is set; individual transfers are not
    /// bounded, matching the speed-test measurement semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// The underlying HTTP client, for the speed-test engine.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for an endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// URL of the speed-test ping endpoint.
    #[must_use]
    pub fn ping_url(&self) -> String {
        self.endpoint(SPEED_PING)
    }

    /// URL of the speed-test download endpoint for a payload of `size_mb`.
    #[must_use]
    pub fn download_url(&self, size_mb: u64) -> String {
        format!("{}?size={size_mb}", self.endpoint(SPEED_DOWNLOAD))
    }

    /// URL of the speed-test upload endpoint.
    #[must_use]
    pub fn upload_url(&self) -> String {
        self.endpoint(SPEED_UPLOAD)
    }

    /// `GET /api/my-ip`.
    pub async fn my_ip(&self) -> Result<IpInfo> {
        self.get_json(MY_IP).await
    }

    /// `GET /api/ipv6-check`.
    pub async fn ipv6_check(&self) -> Result<Ipv6Check> {
        self.get_json(IPV6_CHECK).await
    }

    /// Fetch the caller's IP info and IPv6 connectivity in parallel and
    /// merge them into one view model.
    ///
    /// A failure of the primary request is fatal; a failure of the
    /// secondary IPv6 probe is tolerated silently and its fields stay
    /// empty.
    pub async fn my_ip_full(&self) -> Result<IpInfo> {
        let (primary, secondary) = tokio::join!(self.my_ip(), self.ipv6_check());
        let mut info = primary?;
        match secondary {
            Ok(check) => info.merge(&check),
            Err(e) => tracing::debug!("ipv6 check failed, continuing without it: {e}"),
        }
        Ok(info)
    }

    /// `POST /api/isp-lookup`.
    pub async fn isp_lookup(&self, ip: &str) -> Result<IspLookup> {
        let ip = validated_ip(ip)?;
        self.post_json(ISP_LOOKUP, &IpQuery { ip }).await
    }

    /// `POST /api/asn-lookup`.
    pub async fn asn_lookup(&self, ip: &str) -> Result<AsnLookup> {
        let ip = validated_ip(ip)?;
        self.post_json(ASN_LOOKUP, &IpQuery { ip }).await
    }

    /// `POST /api/hosting-check`.
    pub async fn hosting_check(&self, ip: &str) -> Result<HostingCheck> {
        let ip = validated_ip(ip)?;
        self.post_json(HOSTING_CHECK, &IpQuery { ip }).await
    }

    /// `POST /api/proxy-check`.
    pub async fn proxy_check(&self, ip: &str) -> Result<ProxyCheck> {
        let ip = validated_ip(ip)?;
        self.post_json(PROXY_CHECK, &IpQuery { ip }).await
    }

    /// `POST /api/reverse-dns`.
    pub async fn reverse_dns(&self, ip: &str) -> Result<ReverseDns> {
        let ip = validated_ip(ip)?;
        self.post_json(REVERSE_DNS, &IpQuery { ip }).await
    }

    /// `POST /api/hostname-to-ip`.
    pub async fn hostname_to_ip(&self, hostname: &str) -> Result<HostnameToIp> {
        let hostname = validate::validate_hostname(hostname)?.to_string();
        self.post_json(HOSTNAME_TO_IP, &HostnameQuery { hostname })
            .await
    }

    /// `GET /api/dns-leak-test`.
    pub async fn dns_leak_test(&self) -> Result<DnsLeakTest> {
        self.get_json(DNS_LEAK_TEST).await
    }

    /// `POST /api/email-trace`.
    pub async fn email_trace(&self, headers: &str) -> Result<EmailTrace> {
        if headers.trim().is_empty() {
            return Err(Error::validation("email headers are empty"));
        }
        self.post_json(
            EMAIL_TRACE,
            &HeadersQuery {
                headers: headers.to_string(),
            },
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!("POST {url}");
        let response = self.http.post(&url).json(body).send().await?;
        decode(response).await
    }
}

/// Validate and normalize an IP argument before building a request.
fn validated_ip(ip: &str) -> Result<String> {
    validate::validate_ip(ip)?;
    Ok(ip.trim().to_string())
}

/// Parse a success body, or map a non-2xx reply to an `Api` error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_response(status, &body));
    }
    Ok(response.json::<T>().await?)
}

/// Build the user-visible error for a non-2xx reply.
fn error_from_response(status: StatusCode, body: &str) -> Error {
    let message =
        api_error_message(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Error::api(status.as_u16(), message)
}

/// Extract `detail.message` (or a bare string `detail`) from an error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Object(detail) => {
            detail.get("message")?.as_str().map(str::to_string)
        }
        serde_json::Value::String(message) => Some(message.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_message_extracted() {
        let body = r#"{"detail": {"message": "ASN not found"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("ASN not found"));
    }

    #[test]
    fn test_bare_string_detail_extracted() {
        let body = r#"{"detail": "rate limit exceeded"}"#;
        assert_eq!(
            api_error_message(body).as_deref(),
            Some("rate limit exceeded")
        );
    }

    #[test]
    fn test_malformed_body_falls_back_to_status() {
        assert_eq!(api_error_message("<html>oops</html>"), None);
        assert_eq!(api_error_message(""), None);

        let err = error_from_response(StatusCode::SERVICE_UNAVAILABLE, "<html>oops</html>");
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[test]
    fn test_error_state_carries_exact_message() {
        let err = error_from_response(
            StatusCode::NOT_FOUND,
            r#"{"detail": {"message": "ASN not found"}}"#,
        );
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "ASN not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_download_url_carries_size() {
        let config = Config::from_json(r#"{"api_base": "http://localhost:8000"}"#).unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.download_url(10),
            "http://localhost:8000/api/speed-test/download?size=10"
        );
        assert_eq!(
            client.ping_url(),
            "http://localhost:8000/api/speed-test/ping"
        );
    }

    #[test]
    fn test_invalid_ip_rejected_before_request() {
        assert!(validated_ip("999.1.1.1").is_err());
        assert!(validated_ip("::1").is_err());
        assert_eq!(validated_ip(" 8.8.8.8 ").unwrap(), "8.8.8.8");
    }
}
