use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use catalog::{
    seed_if_empty, CatalogStore, DispatchOutcome, SeedBundle, SeedOutcome, SelectionController,
};
use clap::{Parser, Subcommand};
use shared::protocol::CarCommand;
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod session;
mod terminal;

use config::{load_settings, normalize_database_url, DEFAULT_CONFIG_FILE};
use terminal::TerminalSink;

#[derive(Parser, Debug)]
#[command(name = "mycars", about = "Car catalog with ratings, trips and a favorite")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    seed_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the seed bundle if this database has not been seeded yet.
    Seed,
    /// List the selectable marks.
    Marks,
    Show {
        mark: String,
    },
    /// Start the engine of a car.
    Start {
        mark: String,
    },
    Rate {
        mark: String,
        value: String,
    },
    /// Make a car the favorite.
    Favorite {
        mark: String,
    },
    /// Interactive session reading commands from stdin.
    Session,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_settings(&cli.config);
    let mut settings = loaded.settings.clone();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    if let Some(seed_dir) = cli.seed_dir {
        settings.seed_dir = seed_dir;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    loaded.log_warnings();

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify the path and permissions"
        );
        error
    })?;
    let bundle = SeedBundle::new(&settings.seed_dir);
    let mut controller = SelectionController::new(storage, TerminalSink::new(io::stdout()))
        .with_render_options(settings.render_options());

    match cli.command.unwrap_or(Command::Session) {
        Command::Seed => {
            let outcome = seed_if_empty(controller.store(), &bundle)
                .await
                .context("seeding failed")?;
            match outcome {
                SeedOutcome::AlreadySeeded => println!("catalog already seeded"),
                SeedOutcome::Seeded { inserted, skipped } => {
                    println!("seeded {inserted} cars ({skipped} skipped)")
                }
                SeedOutcome::Skipped { reason } => println!("seeding skipped: {reason}"),
            }
        }
        Command::Marks => {
            ensure_seeded(controller.store(), &bundle).await;
            for mark in controller.store().list_marks().await? {
                println!("{mark}");
            }
        }
        Command::Show { mark } => {
            ensure_seeded(controller.store(), &bundle).await;
            run_one_shot(&mut controller, mark, None).await;
        }
        Command::Start { mark } => {
            ensure_seeded(controller.store(), &bundle).await;
            run_one_shot(&mut controller, mark, Some(CarCommand::StartEngine)).await;
        }
        Command::Rate { mark, value } => {
            ensure_seeded(controller.store(), &bundle).await;
            run_one_shot(&mut controller, mark, Some(CarCommand::Rate { input: value })).await;
        }
        Command::Favorite { mark } => {
            ensure_seeded(controller.store(), &bundle).await;
            run_one_shot(&mut controller, mark, Some(CarCommand::ToggleFavorite)).await;
        }
        Command::Session => {
            let report = controller
                .startup(&bundle, settings.initial_mark.as_deref())
                .await;
            info!(selected = ?report.selected, "session started");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session::run_session(&mut controller, stdin).await?;
        }
    }

    Ok(())
}

async fn ensure_seeded(store: &Storage, bundle: &SeedBundle) {
    if let Err(err) = seed_if_empty(store, bundle).await {
        error!(error = %err, "catalog seeding failed");
    }
}

async fn run_one_shot(
    controller: &mut SelectionController<Storage, TerminalSink<io::Stdout>>,
    mark: String,
    command: Option<CarCommand>,
) {
    let mut commands = vec![CarCommand::Select { mark }];
    commands.extend(command);
    for command in commands {
        if let DispatchOutcome::Rejected(err) = controller.dispatch(command).await {
            eprintln!("{err}");
            break;
        }
    }
}
