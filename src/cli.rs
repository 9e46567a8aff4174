//! Flag handling and logging setup shared by the example binaries.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use witai_core::{ClientConfig, Verbosity};
use witai_engine::ContextOptions;

#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Recording device name
    #[arg(short, long)]
    pub device: Option<String>,

    /// Client access token for the wit.ai app
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Engine name: `null`, or `native` when built with the `native` feature
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Library log level: error, warn, info, debug or 1-4
    #[arg(short, long)]
    pub verbosity: Option<Verbosity>,

    /// Send this text instead of recording from the device
    #[arg(short, long)]
    pub text: Option<String>,
}

impl ClientArgs {
    /// Builds context options from the config file (if any), then applies
    /// flags and environment on top. `fallback` is the verbosity used when
    /// neither a flag nor a config file sets one.
    pub fn context_options(&self, fallback: Verbosity) -> Result<ContextOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let config = ClientConfig::load_from_file(path)
                    .with_context(|| format!("failed to load config from {:?}", path))?;
                ContextOptions::from_config(&config)
            }
            None => {
                let mut options = ContextOptions::default();
                options.verbosity = fallback;
                options
            }
        };

        if let Some(device) = &self.device {
            options.device = device.clone();
        }
        if let Some(token) = &self.access_token {
            options.access_token = token.clone();
        }
        if let Some(engine) = &self.engine {
            options.engine = Some(engine.clone());
        }
        if let Some(verbosity) = self.verbosity {
            options.verbosity = verbosity;
        }
        Ok(options)
    }

    /// Level for the library crates' logs: the resolved options when they
    /// loaded, otherwise the flag, otherwise `fallback`.
    pub fn log_verbosity(
        &self,
        options: Option<&ContextOptions>,
        fallback: Verbosity,
    ) -> Verbosity {
        options
            .map(|options| options.verbosity)
            .or(self.verbosity)
            .unwrap_or(fallback)
    }
}

/// Program events stay at `info`; the library crates follow `verbosity`.
pub fn default_filter(verbosity: Verbosity) -> String {
    let level = verbosity.as_str();
    format!("info,witai={level},witai_core={level},witai_engine={level}")
}

pub fn init_tracing(verbosity: Verbosity) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}
