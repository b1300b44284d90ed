// src/main.rs

use clap::Parser;
use color_eyre::eyre::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

mod config;
mod core;
mod logging;

use config::ScanConfig;

/// Concurrent domain reconnaissance: ports, WHOIS, technologies, sitemap and hidden paths.
#[derive(Parser, Debug)]
#[command(name = "webradar", version, about)]
struct Cli {
    /// Domain to scan. A full URL is accepted and reduced to its host.
    domain: String,

    /// Wordlist used for hidden path discovery.
    #[arg(short, long, default_value = "wordlist.txt")]
    wordlist: PathBuf,

    /// Comma-separated TCP ports to probe instead of the default list.
    #[arg(short, long, value_delimiter = ',')]
    ports: Option<Vec<u16>>,

    /// Maximum number of path probes in flight.
    #[arg(short, long, default_value_t = config::DEFAULT_PATH_CONCURRENCY)]
    threads: usize,

    /// TCP connect timeout for port probes, in seconds.
    #[arg(long, default_value_t = 2)]
    timeout: u64,

    /// Directory the JSON result is written to.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Print the summary without writing the JSON file.
    #[arg(long)]
    no_save: bool,

    /// Directory for the log file. Defaults to the per-user data directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            ports: self.ports.clone(),
            port_timeout: Duration::from_secs(self.timeout),
            wordlist: self.wordlist.clone(),
            path_concurrency: self.threads,
            ..Default::default()
        }
    }
}

/// Reduces pasted input such as `https://example.com/path` to its host.
fn normalize_domain(raw: &str) -> String {
    let raw = raw.trim();
    let with_scheme = if !raw.starts_with("http://") && !raw.starts_with("https://") {
        format!("https://{}", raw)
    } else {
        raw.to_string()
    };
    Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| raw.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::initialize_logging(cli.log_dir.as_deref())?;

    let domain = normalize_domain(&cli.domain);
    if domain.is_empty() {
        bail!("a domain is required");
    }

    println!("Scanning {domain}... (this may take 30-120 seconds, log: {})", log_path.display());
    let result = match core::scanner::run_full_scan(&domain, &cli.scan_config()).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Scan aborted.");
            bail!(e);
        }
    };

    print!("{}", core::report::render_summary(&result));

    if !cli.no_save {
        let path = core::export::save_json(&result, &cli.output)?;
        info!(path = %path.display(), "Results exported.");
        println!("→ Results saved to: {}", path.display());
    }
    Ok(())
}
