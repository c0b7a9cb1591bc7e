//! Interactive command loop over a line-oriented input.

use catalog::{CatalogStore, DisplaySink, DispatchOutcome, SelectionController};
use shared::{error::CatalogError, protocol::CarCommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub const HELP: &str = "commands: marks | select <mark> | start | rate [value] | favorite | help | quit";
const RATING_PROMPT: &str = "Rate this car please (0-10, empty line cancels):";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Command(CarCommand),
    RatePrompt,
    Marks,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<SessionInput, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "" => SessionInput::Empty,
        "marks" | "list" => SessionInput::Marks,
        "select" | "show" if rest.is_empty() => return Err(format!("usage: {verb} <mark>")),
        "select" | "show" => SessionInput::Command(CarCommand::Select {
            mark: rest.to_string(),
        }),
        "start" => SessionInput::Command(CarCommand::StartEngine),
        "rate" if rest.is_empty() => SessionInput::RatePrompt,
        "rate" => SessionInput::Command(CarCommand::Rate {
            input: rest.to_string(),
        }),
        "favorite" | "fav" => SessionInput::Command(CarCommand::ToggleFavorite),
        "help" | "?" => SessionInput::Help,
        "quit" | "exit" => SessionInput::Quit,
        other => return Err(format!("unknown command '{other}'; {HELP}")),
    };
    Ok(input)
}

/// Runs until `quit` or end of input.
pub async fn run_session<S, D, R>(
    controller: &mut SelectionController<S, D>,
    input: R,
) -> anyhow::Result<()>
where
    S: CatalogStore,
    D: DisplaySink,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(SessionInput::Command(command)) => command,
            Ok(SessionInput::RatePrompt) => {
                if prompt_rating(controller, &mut lines).await? {
                    continue;
                }
                break;
            }
            Ok(SessionInput::Marks) => {
                match controller.available_marks().await {
                    Ok(marks) => println!("{}", marks.join(" | ")),
                    Err(err) => println!("{err}"),
                }
                continue;
            }
            Ok(SessionInput::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(SessionInput::Quit) => break,
            Ok(SessionInput::Empty) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        if let DispatchOutcome::Rejected(err) = controller.dispatch(command).await {
            if !matches!(err, CatalogError::Validation { .. }) {
                println!("{err}");
            }
        }
    }

    Ok(())
}

/// Asks for a rating until one is accepted or the entry is cancelled.
/// Returns `false` when the input ends.
async fn prompt_rating<S, D, R>(
    controller: &mut SelectionController<S, D>,
    lines: &mut Lines<R>,
) -> anyhow::Result<bool>
where
    S: CatalogStore,
    D: DisplaySink,
    R: AsyncBufRead + Unpin,
{
    if controller.selection().is_none() {
        println!("{}", CatalogError::NoSelection);
        return Ok(true);
    }

    loop {
        println!("{RATING_PROMPT}");
        let Some(entry) = lines.next_line().await? else {
            return Ok(false);
        };
        let command = if entry.trim().is_empty() {
            CarCommand::CancelRating
        } else {
            CarCommand::Rate { input: entry }
        };
        match controller.dispatch(command).await {
            DispatchOutcome::Rejected(CatalogError::Validation { .. }) => continue,
            DispatchOutcome::Rejected(err) => {
                println!("{err}");
                return Ok(true);
            }
            DispatchOutcome::Rendered | DispatchOutcome::Cancelled => return Ok(true),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
