use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use itinerary_import::cli::{Cli, Command, MigrateCommand, TagsCommand};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    itinerary_import::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Import(args) => {
            itinerary_import::importer::run(args)
                .await
                .context("import")?;
        }
        Command::Tags {
            command: TagsCommand::List(args),
        } => {
            itinerary_import::tag_admin::list(args)
                .await
                .context("tags list")?;
        }
        Command::Tags {
            command: TagsCommand::Reorder(args),
        } => {
            itinerary_import::tag_admin::reorder(args)
                .await
                .context("tags reorder")?;
        }
        Command::Tags {
            command: TagsCommand::Seed(args),
        } => {
            itinerary_import::tag_admin::seed(args)
                .await
                .context("tags seed")?;
        }
        Command::Migrate {
            command: MigrateCommand::Export(args),
        } => {
            itinerary_import::migrate::export(args)
                .await
                .context("migrate export")?;
        }
        Command::Migrate {
            command: MigrateCommand::Import(args),
        } => {
            itinerary_import::migrate::import(args)
                .await
                .context("migrate import")?;
        }
        Command::Check(args) => {
            itinerary_import::check::run(args).await.context("check")?;
        }
    }

    Ok(())
}
