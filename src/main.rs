use std::{path::PathBuf, process::exit};

use clap::Parser;
use compact_str::ToCompactString;

use crate::{
    app_init::{initialize_logging, run_exporter, run_once},
    config::{default_config_path, load_config, save_config, ExporterConfig},
    result::{ExporterError, Result},
};

mod app_init;
mod client;
mod config;
mod domain;
mod id;
mod logging;
mod metrics;
mod result;
mod server;
mod stores;

/// Exports GitLab project and merge request statistics as Prometheus metrics
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Write the effective configuration to the configuration file and exit.
    #[arg(long)]
    write_config: bool,
    /// Base URL of the GitLab instance, e.g. https://gitlab.example.com
    #[arg(long, env = "GITLAB_URL")]
    gitlab_url: Option<String>,
    /// Personal access token used for all API requests.
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    gitlab_token: Option<String>,
    /// Address for the metrics endpoint, e.g. 0.0.0.0:9168
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,
    /// Seconds between poll cycles.
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,
    /// Run a single poll cycle, print the metrics to stdout and exit.
    #[arg(long)]
    once: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut ExporterConfig) {
        if let Some(url) = &self.gitlab_url {
            config.gitlab_url = url.clone();
        }
        if let Some(token) = &self.gitlab_token {
            config.gitlab_token = token.clone();
        }
        if let Some(listen) = &self.listen {
            config.listen_address = listen.clone();
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()
        .map_err(|e| ExporterError::GeneralError(format!("failed to install color_eyre: {e}").into()))?;

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    let mut config = load_config(&config_path)?;
    args.apply_overrides(&mut config);

    if args.write_config {
        save_config(&config_path, &config)?;
        println!("Configuration written to {}", config_path.display());
        return Ok(());
    }

    config
        .validate()
        .map_err(|e| ExporterError::ConfigError(e.to_compact_string()))?;

    let debug = std::env::var("GITLAB_EXPORTER_DEBUG").is_ok();
    let _log_guard = initialize_logging(&config)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        ExporterError::GeneralError(format!("Failed to create runtime: {e}").into())
    })?;

    if args.once {
        rt.block_on(run_once(config, debug))
    } else {
        rt.block_on(run_exporter(config, debug))
    }
}
