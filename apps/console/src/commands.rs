use anyhow::{anyhow, bail, Context, Result};
use client_core::{SessionStatus, SessionView};
use shared::domain::CellKind;

pub const HELP: &str = "\
commands:
  tool <empty|obstacle|catcher|runner>  select what paint places
  paint <row> <col>                     paint the selected tool into a cell
  start                                 validate and start the simulation
  stop                                  stop the running simulation
  reset                                 clear the grid and any error
  show                                  print the grid again
  quit                                  leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tool(CellKind),
    Paint { row: usize, col: usize },
    Start,
    Stop,
    Reset,
    Show,
    Help,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "tool" => {
            let label = words.next().context("usage: tool <empty|obstacle|catcher|runner>")?;
            let kind = CellKind::parse_label(label)
                .ok_or_else(|| anyhow!("unknown tool '{label}'"))?;
            Command::Tool(kind)
        }
        "paint" => {
            let row = parse_index(words.next(), "row")?;
            let col = parse_index(words.next(), "col")?;
            Command::Paint { row, col }
        }
        "start" => Command::Start,
        "stop" => Command::Stop,
        "reset" => Command::Reset,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}'; type 'help'"),
    };

    if words.next().is_some() {
        bail!("too many arguments for '{verb}'");
    }
    Ok(Some(command))
}

/// Operator-facing reason a command has no effect in the current view.
pub fn refusal(command: Command, current: &SessionView) -> Option<String> {
    match command {
        Command::Tool(_) if current.is_simulating => {
            Some("the palette is locked while the simulation runs".to_string())
        }
        Command::Paint { .. } if current.is_simulating => {
            Some("editing is locked while the simulation runs".to_string())
        }
        Command::Paint { row, col } => {
            let size = current.grid.size();
            (row >= size || col >= size)
                .then(|| format!("cell ({row}, {col}) is outside the {size}x{size} grid"))
        }
        Command::Start if current.is_simulating => {
            Some("a simulation is already running".to_string())
        }
        Command::Start if current.status == SessionStatus::Errored => {
            Some("reset the scenario before starting again".to_string())
        }
        _ => None,
    }
}

fn parse_index(raw: Option<&str>, name: &str) -> Result<usize> {
    let raw = raw.with_context(|| format!("usage: paint <row> <col> (missing {name})"))?;
    raw.parse::<usize>()
        .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'"))
}
