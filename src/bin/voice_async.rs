use anyhow::{Context as _, Result};
use clap::Parser;
use std::process::ExitCode;
use witai::cli::{self, ClientArgs};
use witai::{
    Context, ContextOptions, EngineRegistry, QueryResponse, QueryResult, Verbosity, WitError,
};

const VERBOSITY: Verbosity = Verbosity::Error;

#[derive(Parser)]
#[command(
    name = "voice-async",
    about = "Record a voice command and receive the interpretation through a callback"
)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = cli.client.context_options(VERBOSITY);
    let level = cli.client.log_verbosity(options.as_ref().ok(), VERBOSITY);
    if let Err(e) = cli::init_tracing(level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let outcome = match options {
        Ok(options) => run(&cli, &options).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, options: &ContextOptions) -> Result<()> {
    let registry = EngineRegistry::new();

    let mut ctx = Context::open(options, &registry).context("cannot create wit-ai context")?;

    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<Result<QueryResponse, WitError>>();
    let on_done = move |payload: String| {
        let parsed = QueryResult::parse(&payload).and_then(QueryResult::into_primary);
        // Receiver only disappears when the program is already exiting.
        let _ = done_tx.send(parsed);
    };

    match &cli.client.text {
        Some(text) => ctx.text_query_async(text, on_done),
        None => {
            tracing::info!("Say something nice now: ...");
            ctx.voice_query_auto_async(on_done)
        }
    }
    .context("cannot query wit-ai")?;

    let (_, outcome) = done_rx
        .await
        .map_err(|_| WitError::ResponseDropped)
        .and_then(|parsed| parsed)
        .context("invalid wit-ai response")?;

    tracing::info!("Result: {:?}", outcome.text);

    ctx.close().context("cannot close wit-ai context")?;
    Ok(())
}
