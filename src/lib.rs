//! ipscout - IP address and network diagnostic lookup toolkit.
//!
//! This crate provides both a library API and a CLI tool for:
//! - Looking up your own IP address, geolocation and ISP
//! - ISP, ASN, hosting and proxy/VPN lookups for arbitrary addresses
//! - Reverse DNS and hostname resolution (backend or local resolver)
//! - DNS leak testing
//! - Email header tracing
//! - Measuring ping, jitter, download and upload speed over HTTP
//!
//! # Library Usage
//!
//! ```ignore
//! use ipscout::{ApiClient, Config, SpeedTester, NullObserver};
//!
//! let config = Config::load(None)?;
//! let client = ApiClient::new(&config)?;
//!
//! // Look up an address
//! let result = client.isp_lookup("8.8.8.8").await?;
//!
//! // Measure connection speed
//! let tester = SpeedTester::new(client.clone());
//! let report = tester.run(&NullObserver).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Interactive TUI mode (default)
//! ipscout
//!
//! # Your own address
//! ipscout my-ip
//!
//! # Lookups
//! ipscout isp 8.8.8.8
//! ipscout asn 1.1.1.1
//! ipscout proxy 203.0.113.7
//! ipscout resolve example.com --local
//!
//! # Diagnostics
//! ipscout dns-leak
//! ipscout speed
//! ```
//!
//! # Features
//!
//! - **One subcommand per tool**: scriptable output in table or JSON form
//! - **Interactive TUI**: live speed test gauge and connection overview
//! - **Client-side validation**: malformed input never reaches the network
//! - **Best-observed speed policy**: throughput is the best trial, not an
//!   average; latency is an outlier-trimmed mean with jitter

pub mod api;
pub mod cli;
pub mod config;
pub mod dnsutil;
pub mod error;
pub mod lookup;
pub mod speed;
pub mod tui;

// Re-export commonly used types
pub use api::types::{
    AsnLookup, DnsLeakTest, EmailTrace, HostingCheck, HostnameToIp, IpInfo, IspLookup, ProxyCheck,
    ReverseDns, RiskLevel,
};
pub use api::ApiClient;
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use dnsutil::LocalResolver;
pub use error::{Error, Result};
pub use speed::{NullObserver, Phase, SpeedTestObserver, SpeedTestReport, SpeedTester};
