mod client;
mod commands;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use timeline::{
    AnalysisClient, ClientError, EntryId, FetchWindow, OutputKey, OutputSession, ServerOutput, TimeRange,
    TimelineConfig, TimelineModel,
};
use uuid::Uuid;
use viewport::{SignalBus, TimelineWidget, TraceContext};

use crate::client::{FixtureClient, HttpAnalysisClient};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no data source; pass --server or --fixture")]
    MissingSource,
    #[error("missing experiment id; pass --experiment or set TRACELENS_EXPERIMENT")]
    MissingExperiment,
    #[error("invalid navigation step `{0}`")]
    InvalidOp(String),
    #[error("analysis client error: {0}")]
    Client(#[from] ClientError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "tracelens", about = "Trace timeline shaping and navigation CLI")]
struct Cli {
    /// Trace server base URL.
    #[arg(long, env = "TRACELENS_SERVER", conflicts_with = "fixture")]
    server: Option<String>,

    /// Recorded output to serve instead of a server.
    #[arg(long, env = "TRACELENS_FIXTURE")]
    fixture: Option<PathBuf>,

    #[arg(long, env = "TRACELENS_EXPERIMENT")]
    experiment: Option<Uuid>,

    #[arg(long, env = "TRACELENS_OUTPUT", default_value = "timegraph")]
    output: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entry tree.
    Tree,
    /// Fetch and print shaped rows.
    Rows(RowsCommand),
    /// Print every resolved style of the output.
    Styles,
    /// Run navigation steps, printing the state after each one.
    Navigate(NavigateCommand),
}

#[derive(Args, Debug)]
struct RowsCommand {
    /// Window start, relative to the trace origin.
    #[arg(long)]
    start: Option<i64>,
    /// Window end, relative to the trace origin.
    #[arg(long)]
    end: Option<i64>,
    /// Drawable width in pixels.
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct NavigateCommand {
    /// Steps such as `zoom-in@500`, `pan-left`, `select:10-20`.
    ops: Vec<String>,
    /// Fetch rows for the final view.
    #[arg(long)]
    rows: bool,
    #[arg(long)]
    width: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let (client, experiment) = connect(&cli)?;
    let key = OutputKey::new(&experiment.to_string(), &cli.output);
    let trace_id = format!("{}/{}", key.experiment, key.output);
    let config = TimelineConfig::from_env();
    let session = OutputSession::new(ServerOutput::new(client, key), config);

    let tree = session.fetch_tree().await;
    let ids: Vec<EntryId> = tree.flatten(&HashSet::new());

    match cli.command {
        Command::Tree => print!("{}", commands::render_tree(&tree)),
        Command::Styles => print!("{}", commands::render_styles(&*session.style_model(false).await)),
        Command::Rows(args) => {
            let window = match (args.start, args.end) {
                (None, None) => None,
                (start, end) => {
                    let range = TimeRange::new(start.unwrap_or(0), end.unwrap_or_else(|| session.total_length()));
                    Some(FetchWindow::for_width(range, args.width.unwrap_or(config.default_width_px)))
                }
            };
            let model = session.refresh(&ids, window).await.into_model().unwrap_or_default();
            print_model(&model, args.json)?;
        }
        Command::Navigate(args) => {
            let steps = args.ops.iter().map(|raw| commands::parse_op(raw)).collect::<Result<Vec<_>, _>>()?;

            let mut ctx = TraceContext::new(SignalBus::new());
            ctx.switch_trace(&trace_id, commands::absolute_range(session.origin_offset(), session.total_length()));
            for step in steps {
                commands::apply_op(ctx.navigation(), step);
                println!("{}", serde_json::to_string(&ctx.navigation().state())?);
            }

            if args.rows {
                let width = args.width.unwrap_or(config.default_width_px);
                let widget = TimelineWidget::new(&ctx, width, config.fetch_debounce);
                if let Some(window) = widget.poll_fetch(Instant::now()) {
                    widget.apply(session.refresh(&ids, Some(window)).await);
                }
                print_model(&widget.model().unwrap_or_default(), false)?;
            }
        }
    }
    Ok(())
}

fn connect(cli: &Cli) -> Result<(Arc<dyn AnalysisClient>, Uuid), CliError> {
    if let Some(path) = &cli.fixture {
        let client = FixtureClient::load(path)?;
        return Ok((Arc::new(client), cli.experiment.unwrap_or_else(Uuid::nil)));
    }
    let Some(server) = &cli.server else {
        return Err(CliError::MissingSource);
    };
    let experiment = cli.experiment.ok_or(CliError::MissingExperiment)?;
    tracing::info!(%server, %experiment, output = %cli.output, "connecting");
    Ok((Arc::new(HttpAnalysisClient::new(server)?), experiment))
}

fn print_model(model: &TimelineModel, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(model)?);
    } else {
        print!("{}", commands::render_rows(model));
    }
    Ok(())
}
