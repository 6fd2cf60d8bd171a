mod cli;
mod play;
mod render;

use std::sync::Arc;

use services::{AppServices, Clock, SettingsService, StartMode};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

use cli::{Args, ArgsError, Command, Env, WeightsCommand, prepare_sqlite_file, print_usage};
use play::Prompt;

const DEFAULT_LOG_FILTER: &str = "app=info,services=info,storage=warn";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_args() -> Result<Args, ArgsError> {
    Args::parse(std::env::args().skip(1), &Env::from_process()).inspect_err(|e| {
        eprintln!("{e}");
        print_usage();
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    match &args.command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Weights(cmd) => {
            prepare_sqlite_file(&args.db_url)?;
            return run_weights(&args.db_url, cmd).await;
        }
        _ => {}
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let start = if args.fresh {
        StartMode::Fresh
    } else {
        StartMode::Resume
    };
    let mut services =
        AppServices::new_sqlite(&args.db_url, &args.bank_path, Clock::system(), start).await?;
    tracing::info!(
        db = %args.db_url,
        bank = %args.bank_path.display(),
        questions = services.progress().bank().len(),
        ?start,
        "ready"
    );

    let mut prompt = Prompt::stdin();
    let outcome = match args.command {
        Command::Stats => {
            println!("{}", render::dashboard(&services.progress().snapshot()));
            Ok(())
        }
        Command::Play(kind) => play::run_quiz(&mut services, &mut prompt, kind, args.count).await,
        Command::Speed => play::run_speed(&mut services, &mut prompt).await,
        Command::Arcade => play::run_arcade(&mut services, &mut prompt).await,
        Command::Reset => play::run_reset(&mut services, &mut prompt).await,
        Command::Help | Command::Weights(_) => Ok(()),
    };

    let failures = services.progress().save_failures();
    if failures > 0 {
        tracing::warn!(failures, "some progress checkpoints failed; retrying on exit");
    }
    let shutdown = services.shutdown().await;
    outcome?;
    shutdown?;
    Ok(())
}

async fn run_weights(
    db_url: &str,
    cmd: &WeightsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::sqlite(db_url).await?;
    let settings = SettingsService::new(Arc::clone(&storage.settings));

    let weights = match cmd {
        WeightsCommand::Show => settings.load().await?,
        WeightsCommand::Set { field, value } => settings.set_field(field, value).await?,
        WeightsCommand::Reset => settings.reset().await?,
    };
    println!("{}", render::weights(&weights));
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
