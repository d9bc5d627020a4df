//! Command-line interface (CLI) argument parsing module.
//!
//! This module provides CLI argument parsing using `clap`. Each lookup
//! tool is a subcommand; running without a subcommand starts the
//! interactive TUI.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI argument parser using clap derive macro.
///
/// # Example
///
/// ```ignore
/// let cli = Cli::parse();
/// match cli.command {
///     Some(Commands::Isp { ip }) => { /* ... */ }
///     Some(Commands::Speed) => { /* ... */ }
///     None => { /* interactive mode */ }
/// }
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "ipscout",
    version,
    about = "IP address and network diagnostic lookup toolkit",
    long_about = "Look up IP geolocation, ISP, ASN, hosting and proxy status, \
check for DNS leaks, trace email headers, and measure connection speed.",
    infer_subcommands = true
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Backend API base URL
    #[arg(long, global = true, env = "IPSCOUT_API_URL")]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default, human-readable)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get all available output format names.
    #[must_use]
    pub fn names() -> &'static [&'static str] {
        &["table", "json"]
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options are: {:?}",
                s,
                Self::names()
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Available commands for the ipscout CLI.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch the interactive terminal user interface (TUI).
    #[command(alias = "i")]
    Interactive,

    /// Show your own IP address and connection details.
    ///
    /// Fetches the base record and the IPv6 connectivity probe in
    /// parallel and merges them.
    #[command(name = "my-ip", alias = "m")]
    MyIp,

    /// Look up the ISP behind an IP address.
    Isp {
        /// IPv4 or full-notation IPv6 address
        ip: String,
    },

    /// Look up the autonomous system announcing an IP address.
    Asn {
        /// IPv4 or full-notation IPv6 address
        ip: String,
    },

    /// Check whether an IP address belongs to hosting infrastructure.
    Hosting {
        /// IPv4 or full-notation IPv6 address
        ip: String,
    },

    /// Check whether an IP address is a proxy or VPN exit.
    Proxy {
        /// IPv4 or full-notation IPv6 address
        ip: String,
    },

    /// Reverse DNS (PTR) lookup for an IP address.
    Rdns {
        /// IPv4 or full-notation IPv6 address
        ip: String,

        /// Use the system resolver instead of the backend
        #[arg(long)]
        local: bool,
    },

    /// Resolve a hostname to its IP addresses.
    Resolve {
        /// Hostname to resolve
        hostname: String,

        /// Use the system resolver instead of the backend
        #[arg(long)]
        local: bool,
    },

    /// Run the DNS leak test.
    #[command(name = "dns-leak", alias = "d")]
    DnsLeak,

    /// Trace the path of an email from its raw headers.
    ///
    /// Reads the header block from a file, or from stdin when no file
    /// is given.
    #[command(name = "email-trace")]
    EmailTrace {
        /// File containing the raw email headers
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Measure ping, jitter, download and upload speed.
    #[command(alias = "s")]
    Speed,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Parse CLI arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::try_parse_from(["ipscout", "isp", "8.8.8.8"]).unwrap();
        match cli.command {
            Some(Commands::Isp { ip }) => assert_eq!(ip, "8.8.8.8"),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["ipscout", "rdns", "8.8.8.8", "--local"]).unwrap();
        match cli.command {
            Some(Commands::Rdns { ip, local }) => {
                assert_eq!(ip, "8.8.8.8");
                assert!(local);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["ipscout"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_api_base_flag() {
        let cli =
            Cli::try_parse_from(["ipscout", "--api-base", "http://10.0.0.1:9000", "my-ip"])
                .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://10.0.0.1:9000"));
    }
}
