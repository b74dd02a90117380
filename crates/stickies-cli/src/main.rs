//! Stickies CLI - notes with pictures from the terminal
//!
//! Every command drives the same list and form screens a graphical client
//! would, against the store selected by the environment.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::open_repository;
use crate::commands::delete::run_delete;
use crate::commands::download::{run_download, DownloadTarget};
use crate::commands::edit::{run_edit, NoteEdits};
use crate::commands::list::run_list;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stickies=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let repository = open_repository(cli.data_dir.as_deref())?;
    match cli.command {
        Commands::List { json } => run_list(repository, json).await?,
        Commands::Add {
            title,
            content,
            image,
        } => run_add(repository, &title, &content, image.as_deref()).await?,
        Commands::Edit {
            id,
            title,
            content,
            image,
            remove_image,
        } => {
            let edits = NoteEdits {
                title,
                content,
                image,
                remove_image,
            };
            run_edit(repository, &id, edits).await?;
        }
        Commands::Delete { id } => run_delete(repository, &id).await?,
        Commands::Download {
            id,
            all,
            format,
            output,
        } => {
            let target = match id {
                Some(id) if !all => DownloadTarget::Note(id),
                _ => DownloadTarget::All,
            };
            run_download(repository, target, format.into(), output.as_deref()).await?;
        }
    }

    Ok(())
}
