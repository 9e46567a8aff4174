use anyhow::{Context as _, Result};
use clap::Parser;
use std::process::ExitCode;
use witai::cli::{self, ClientArgs};
use witai::{Context, ContextOptions, EngineRegistry, Verbosity};

const VERBOSITY: Verbosity = Verbosity::Debug;

#[derive(Parser)]
#[command(
    name = "voice-query",
    about = "Record a voice command and print how wit.ai interpreted it"
)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = cli.client.context_options(VERBOSITY);
    let level = cli.client.log_verbosity(options.as_ref().ok(), VERBOSITY);
    if let Err(e) = cli::init_tracing(level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match options.and_then(|options| run(&cli, &options)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, options: &ContextOptions) -> Result<()> {
    let registry = EngineRegistry::new();

    let mut ctx = Context::open(options, &registry).context("cannot create wit-ai context")?;

    let response = match &cli.client.text {
        Some(text) => ctx.text_query(text),
        None => {
            tracing::info!("Say something nice: ...");
            ctx.voice_query_auto()
        }
    };
    let (_, outcome) = response.context("cannot query wit-ai")?;

    tracing::info!("Interpreted text: {:?}", outcome.text);

    ctx.close().context("cannot close wit-ai context")?;
    Ok(())
}
