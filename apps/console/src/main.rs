use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, spawn_session, Intent, SessionHandle, SessionView};
use shared::domain::CellKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{parse_command, refusal, Command, HELP};
use render::render;

#[derive(Parser, Debug)]
#[command(about = "Author a pursuit scenario and watch the remote simulation play it out")]
struct Args {
    /// Overrides `server_url` from the settings file and environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    grid_size: Option<usize>,
    /// Settings file; defaults to ./simulation.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref());
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(grid_size) = args.grid_size {
        settings.set_grid_size(grid_size);
    }

    let session = spawn_session(&settings).context("failed to open simulation channel")?;
    let mut view = session.view();
    let mut tool = CellKind::Empty;

    println!("{HELP}\n");
    print!("{}", render(&view.borrow_and_update(), tool));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read operator input")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        println!("{err:#}");
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                let current = view.borrow().clone();
                if !dispatch(&session, command, &mut tool, &current)? {
                    print!("{}", render(&view.borrow(), tool));
                }
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                print!("{}", render(&view.borrow_and_update(), tool));
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Returns true when an intent was submitted; the view update will redraw.
fn dispatch(
    session: &SessionHandle,
    command: Command,
    tool: &mut CellKind,
    current: &SessionView,
) -> Result<bool> {
    if let Some(reason) = refusal(command, current) {
        println!("{reason}");
        return Ok(false);
    }

    let intent = match command {
        Command::Tool(kind) => {
            *tool = kind;
            return Ok(false);
        }
        Command::Paint { row, col } => Intent::SetCell {
            row,
            col,
            kind: *tool,
        },
        Command::Start => Intent::Start,
        Command::Stop => Intent::Stop,
        Command::Reset => Intent::Reset,
        Command::Help => {
            println!("{HELP}");
            return Ok(false);
        }
        Command::Show | Command::Quit => return Ok(false),
    };

    tracing::debug!(intent = intent.name(), "console: submitting intent");
    session
        .submit(intent)
        .context("simulation session is no longer running")?;
    Ok(true)
}
