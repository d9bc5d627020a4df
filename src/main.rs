//! ipscout - IP address and network diagnostic lookup toolkit.
//!
//! Binary entry point for the ipscout CLI application.

#![warn(clippy::all, warnings)]
#![warn(clippy::pedantic, clippy::nursery)]

use clap::CommandFactory;
use ipscout::api::types::{
    AsnLookup, DnsLeakTest, EmailTrace, HostingCheck, HostnameToIp, IpInfo, IspLookup, ProxyCheck,
    ReverseDns,
};
use ipscout::api::ApiClient;
use ipscout::cli::{Cli, Commands, OutputFormat};
use ipscout::config::Config;
use ipscout::dnsutil::LocalResolver;
use ipscout::error::{Error, Result};
use ipscout::speed::{Phase, SpeedTestObserver, SpeedTestReport, SpeedTester};
use ipscout::tui::App;
use std::io::Write;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up logging based on verbosity level.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `quiet` - Enable error-level only logging
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .init();
}

/// Print a labeled value row.
fn kv(label: &str, value: &str) {
    println!("{:<18} {}", format!("{label}:"), value);
}

/// Print a labeled value row when the value is present and non-empty.
fn kv_opt(label: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.is_empty() {
            kv(label, v);
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_ip_info(info: &IpInfo) {
    kv("IP", &info.ip);
    kv_opt("Version", Some(info.version.as_str()));
    kv("Country", &info.country);
    kv("City", &info.city);
    kv_opt("Region", info.region.as_deref());
    kv("ISP", &info.isp);
    kv_opt("Timezone", info.timezone.as_deref());
    kv_opt("Coordinates", info.coordinates.as_deref());
    kv_opt("Browser", info.browser.as_deref());
    kv_opt("OS", info.os.as_deref());
    kv_opt("IPv4 address", info.ipv4_address.as_deref());
    kv_opt("IPv6 address", info.ipv6_address.as_deref());
    if info.ipv6_address.is_some() || info.ipv4_address.is_some() {
        kv("IPv6 connectivity", yes_no(info.has_ipv6()));
    }
}

fn print_isp(result: &IspLookup) {
    kv("ISP", &result.isp);
    kv("Organization", &result.organization);
    kv("ASN", &result.asn);
    kv("Country", &result.country);
    kv("Region", &result.region);
    kv("City", &result.city);
    kv("Postal", &result.postal);
    kv("Timezone", &result.timezone);
    kv("Hostname", &result.hostname);
    kv("Hosting", yes_no(result.is_hosting));
    kv("Datacenter", yes_no(result.is_datacenter));
    if result.cloud.is_cloud {
        kv(
            "Cloud provider",
            result.cloud.provider.as_deref().unwrap_or("unknown"),
        );
    }
    kv("Source", &result.source);
}

fn print_asn(result: &AsnLookup) {
    kv("ASN", &result.asn);
    kv("Name", &result.name);
    kv("Organization", &result.organization);
    kv("Country", &result.country);
    kv_opt("Registry", result.registry.as_deref());
    kv_opt("Prefix", result.prefix.as_deref());
    kv("Source", &result.source);
}

fn print_hosting(result: &HostingCheck) {
    kv("Hosting", yes_no(result.is_hosting));
    kv("Datacenter", yes_no(result.is_datacenter));
    kv_opt("Hosting type", result.hosting_type.as_deref());
    if result.cloud.is_cloud {
        kv(
            "Cloud provider",
            result.cloud.provider.as_deref().unwrap_or("unknown"),
        );
    }
    kv("Organization", &result.organization);
    kv("ASN", &result.asn);
    kv("Hostname", &result.hostname);
    kv_opt("Company", result.company.name.as_deref());
    kv_opt("Company domain", result.company.domain.as_deref());
    kv_opt("Country", result.location.country.as_deref());
    kv_opt("Region", result.location.region.as_deref());
    kv_opt("City", result.location.city.as_deref());
    kv("Source", &result.source);
}

fn print_proxy(result: &ProxyCheck) {
    kv("Proxy detected", yes_no(result.proxy.detected));
    kv_opt("Proxy status", Some(result.proxy.status.as_str()));
    kv("VPN detected", yes_no(result.vpn.detected));
    kv_opt("VPN status", Some(result.vpn.status.as_str()));
    kv_opt("VPN confidence", result.vpn.confidence.as_deref());
    kv("Hosting detected", yes_no(result.hosting.detected));
    kv_opt("Hosting type", result.hosting.kind.as_deref());
    kv("Risk level", result.risk_level.label());
    kv("Country", &result.country);
    kv("ISO code", &result.isocode);
    kv("Provider", &result.provider);
    kv("ASN", &result.asn);
    kv("Source", &result.source);
}

fn print_rdns(result: &ReverseDns) {
    kv("Found", yes_no(result.found));
    kv_opt("Hostname", result.hostname.as_deref());
    for record in &result.ptr_records {
        kv("PTR", record);
    }
    kv_opt("Note", result.message.as_deref());
}

fn print_resolve(result: &HostnameToIp) {
    kv("Found", yes_no(result.found));
    kv_opt("IPv4", result.ipv4.as_deref());
    for addr in &result.ipv6 {
        kv("IPv6", addr);
    }
    if !result.all_ips.is_empty() {
        kv("All addresses", &result.all_ips.join(", "));
    }
    kv_opt("Note", result.message.as_deref());
}

/// Remediation guidance shown when the leak risk is not low.
const REMEDIATION_STEPS: [&str; 4] = [
    "Use a VPN whose tunnel carries its own DNS servers",
    "Enable DNS-over-HTTPS or DNS-over-TLS in your browser or OS",
    "Point your resolver at a trusted public DNS service",
    "Re-run this test after changing your configuration",
];

fn print_dns_leak(result: &DnsLeakTest) {
    kv("Your IP", &result.client_ip);
    kv_opt("Country", result.client_country.as_deref());
    kv_opt("ISP", result.client_isp.as_deref());
    kv("Leak detected", yes_no(result.leak_detected));
    kv("Risk level", result.risk_level.label());
    kv("Message", &result.message);
    kv_opt("Note", Some(result.note.as_str()));

    if !result.dns_details.is_empty() {
        println!("\nDNS servers seen ({}):\n", result.dns_details.len());
        println!("{:<4} {:<18} {:<28} {:<22} {:<12}", "#", "IP", "Hostname", "ISP", "Country");
        println!("{}", "-".repeat(86));
        for (idx, server) in result.dns_details.iter().enumerate() {
            println!(
                "{:<4} {:<18} {:<28} {:<22} {:<12}",
                idx + 1,
                server.ip,
                server.hostname.as_deref().unwrap_or("-"),
                server.isp.as_deref().unwrap_or("-"),
                server.country.as_deref().unwrap_or("-"),
            );
        }
    } else if !result.dns_servers.is_empty() {
        println!("\nDNS servers seen:");
        for server in &result.dns_servers {
            println!("  {server}");
        }
    }

    if result.risk_level.needs_attention() {
        println!("\nRecommended steps:");
        for step in REMEDIATION_STEPS {
            println!("  - {step}");
        }
    }
}

fn print_email_trace(result: &EmailTrace) {
    kv("Origin found", yes_no(result.found));
    kv_opt("Origin IP", result.origin_ip.as_deref());
    kv_opt("Origin country", result.origin_country.as_deref());
    kv_opt("Origin ISP", result.origin_isp.as_deref());
    kv_opt("Note", result.message.as_deref());

    if !result.hops.is_empty() {
        println!("\nRelay path ({} hops):\n", result.hops.len());
        println!("{:<5} {:<18} {:<30} {:<24}", "Hop", "IP", "Host", "Received by");
        println!("{}", "-".repeat(78));
        for hop in &result.hops {
            println!(
                "{:<5} {:<18} {:<30} {:<24}",
                hop.hop,
                hop.ip.as_deref().unwrap_or("-"),
                hop.host.as_deref().unwrap_or("-"),
                hop.by.as_deref().unwrap_or("-"),
            );
        }
    }
}

fn print_speed_report(report: &SpeedTestReport) {
    println!("\n=== Results ===");
    kv("Ping", &format!("{:.1} ms", report.ping_ms));
    kv("Jitter", &format!("{:.1} ms", report.jitter_ms));
    kv("Download", &format!("{:.2} Mbps", report.download_mbps));
    kv("Upload", &format!("{:.2} Mbps", report.upload_mbps));
    kv(
        "Peak download",
        &format!("{:.2} Mbps", report.peak_download_mbps),
    );
    let trials: Vec<String> = report
        .download_trials
        .iter()
        .map(|s| format!("{s:.1}"))
        .collect();
    kv("Download trials", &trials.join(" / "));
    let trials: Vec<String> = report
        .upload_trials
        .iter()
        .map(|s| format!("{s:.1}"))
        .collect();
    kv("Upload trials", &trials.join(" / "));
}

/// Progress printer for the non-interactive speed test.
struct CliProgress;

impl SpeedTestObserver for CliProgress {
    fn phase_changed(&self, phase: Phase) {
        match phase {
            Phase::Ping => println!("Measuring latency..."),
            Phase::Download => println!("\nMeasuring download speed..."),
            Phase::Upload => println!("\nMeasuring upload speed..."),
            _ => {}
        }
    }

    fn ping_sample(&self, seq: usize, ms: f64) {
        print!("\r  probe {:>2}/{}: {:>6.1} ms   ", seq + 1, ipscout::speed::engine::PING_PROBES, ms);
        let _ = std::io::stdout().flush();
    }

    fn live_throughput(&self, _phase: Phase, mbps: f64) {
        print!("\r  {mbps:>8.1} Mbps   ");
        let _ = std::io::stdout().flush();
    }

    fn trial_finished(&self, _phase: Phase, trial: usize, mbps: f64) {
        println!("\r  trial {}: {:.2} Mbps        ", trial + 1, mbps);
    }
}

async fn run_my_ip(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.my_ip_full().await?;
    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => print_ip_info(&info),
    }
    Ok(())
}

async fn run_isp(client: &ApiClient, ip: &str, format: OutputFormat) -> Result<()> {
    let result = client.isp_lookup(ip).await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_isp(&result),
    }
    Ok(())
}

async fn run_asn(client: &ApiClient, ip: &str, format: OutputFormat) -> Result<()> {
    let result = client.asn_lookup(ip).await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_asn(&result),
    }
    Ok(())
}

async fn run_hosting(client: &ApiClient, ip: &str, format: OutputFormat) -> Result<()> {
    let result = client.hosting_check(ip).await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_hosting(&result),
    }
    Ok(())
}

async fn run_proxy(client: &ApiClient, ip: &str, format: OutputFormat) -> Result<()> {
    let result = client.proxy_check(ip).await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_proxy(&result),
    }
    Ok(())
}

async fn run_rdns(client: &ApiClient, ip: &str, local: bool, format: OutputFormat) -> Result<()> {
    let result = if local {
        ipscout::lookup::validate::validate_ip(ip)?;
        let addr = ip
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("'{ip}' is not a valid IP address")))?;
        LocalResolver::new()?.reverse(addr).await?
    } else {
        client.reverse_dns(ip).await?
    };
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_rdns(&result),
    }
    Ok(())
}

async fn run_resolve(
    client: &ApiClient,
    hostname: &str,
    local: bool,
    format: OutputFormat,
) -> Result<()> {
    let result = if local {
        LocalResolver::new()?.resolve(hostname).await?
    } else {
        client.hostname_to_ip(hostname).await?
    };
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_resolve(&result),
    }
    Ok(())
}

async fn run_dns_leak(client: &ApiClient, format: OutputFormat) -> Result<()> {
    println!("Running DNS leak test...\n");
    let result = client.dns_leak_test().await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_dns_leak(&result),
    }
    Ok(())
}

async fn run_email_trace(
    client: &ApiClient,
    file: Option<std::path::PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let headers = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let result = client.email_trace(&headers).await?;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_email_trace(&result),
    }
    Ok(())
}

async fn run_speed(client: &ApiClient, format: OutputFormat) -> Result<()> {
    // The connection overview is fetched first, like the page widget;
    // its failure is a top-level error rather than a skipped probe.
    let info = client.my_ip_full().await?;
    let tester = SpeedTester::new(client.clone());

    match format {
        OutputFormat::Json => {
            let report = tester.run(&ipscout::speed::NullObserver).await?;
            print_json(&report)?;
        }
        OutputFormat::Table => {
            println!("Connection: {} ({})\n", info.ip, info.isp);
            let report = tester.run(&CliProgress).await?;
            print_speed_report(&report);
        }
    }
    Ok(())
}

fn run_completions(shell: clap_complete::Shell) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "ipscout", &mut std::io::stdout());
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.api_base.clone())?;
    let client = ApiClient::new(&config)?;

    match cli.command {
        None | Some(Commands::Interactive) => {
            let mut app = App::new(client);
            app.run().await?;
        }
        Some(Commands::MyIp) => run_my_ip(&client, cli.format).await?,
        Some(Commands::Isp { ip }) => run_isp(&client, &ip, cli.format).await?,
        Some(Commands::Asn { ip }) => run_asn(&client, &ip, cli.format).await?,
        Some(Commands::Hosting { ip }) => run_hosting(&client, &ip, cli.format).await?,
        Some(Commands::Proxy { ip }) => run_proxy(&client, &ip, cli.format).await?,
        Some(Commands::Rdns { ip, local }) => run_rdns(&client, &ip, local, cli.format).await?,
        Some(Commands::Resolve { hostname, local }) => {
            run_resolve(&client, &hostname, local, cli.format).await?;
        }
        Some(Commands::DnsLeak) => run_dns_leak(&client, cli.format).await?,
        Some(Commands::EmailTrace { file }) => run_email_trace(&client, file, cli.format).await?,
        Some(Commands::Speed) => run_speed(&client, cli.format).await?,
        Some(Commands::Completions { shell }) => run_completions(shell),
    }

    Ok(())
}

/// Main entry point for the ipscout CLI application.
#[tokio::main]
async fn main() {
    // Set up panic hook for better error reporting
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("ipscout crashed: {panic_info}");
    }));

    let cli = ipscout::cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::debug!("ipscout starting...");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
