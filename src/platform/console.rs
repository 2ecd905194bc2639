//! Line-oriented shell
//!
//! Drives the same controller as the map window from text commands, so the
//! widget can be used (and scripted) without a windowing system. Stdin is
//! read on its own thread; the UI loop waits on both the line channel and
//! the dispatcher's completion channel.

use std::io::{self, BufRead, Write};
use std::thread;

use crossbeam_channel::{Receiver, select, unbounded};
use thiserror::Error;

use crate::app::controller::{MapController, PROMPT_MESSAGE, ShellCommand};
use crate::app::dispatch::Completion;
use crate::domain::geo::Coordinate;
use crate::input::{Intent, Key, button_intent, key_intent};
use crate::ui::layout::Control;

pub const HELP: &str = "\
Commands:
  search <city>        look up a city and center on it
  select               enter select mode
  move <lat> <lon>     move the pointer over a map position
  leave                move the pointer off the map
  click <lat> <lon>    click a map position
  up | down            arrow keys (also ArrowUp / ArrowDown): grow or shrink the radius
  + | -                Increase / Decrease buttons
  zoom <levels>        zoom the map in (positive) or out (negative)
  state                print the current state
  help                 show this text
  quit                 exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Search(String),
    Select,
    Move(Coordinate),
    Leave,
    Click(Coordinate),
    Key(Key),
    Button(Control),
    Zoom(f64),
    State,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command {0:?}, try \"help\"")]
    Unknown(String),
    #[error("{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("Invalid coordinate {0:?}")]
    BadCoordinate(String),
    #[error("Invalid number {0:?}")]
    BadNumber(String),
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "search" => {
            if rest.is_empty() {
                Err(ParseError::MissingArgument {
                    command: "search",
                    expected: "a city name",
                })
            } else {
                Ok(ConsoleCommand::Search(rest.to_string()))
            }
        }
        "select" => Ok(ConsoleCommand::Select),
        "move" => parse_position("move", rest).map(ConsoleCommand::Move),
        "leave" => Ok(ConsoleCommand::Leave),
        "click" => parse_position("click", rest).map(ConsoleCommand::Click),
        "+" => Ok(ConsoleCommand::Button(Control::IncreaseRadius)),
        "-" => Ok(ConsoleCommand::Button(Control::DecreaseRadius)),
        "zoom" => rest
            .parse::<f64>()
            .ok()
            .filter(|levels| levels.is_finite())
            .map(ConsoleCommand::Zoom)
            .ok_or_else(|| {
                if rest.is_empty() {
                    ParseError::MissingArgument {
                        command: "zoom",
                        expected: "a number of levels",
                    }
                } else {
                    ParseError::BadNumber(rest.to_string())
                }
            }),
        "state" => Ok(ConsoleCommand::State),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Key::from_name(other)
            .map(ConsoleCommand::Key)
            .ok_or_else(|| ParseError::Unknown(other.to_string())),
    }
}

fn parse_position(command: &'static str, rest: &str) -> Result<Coordinate, ParseError> {
    let parts: Vec<&str> = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    let [lat, lon] = parts.as_slice() else {
        return Err(ParseError::MissingArgument {
            command,
            expected: "<lat> <lon>",
        });
    };
    let lat: f64 = lat.parse().map_err(|_| ParseError::BadNumber(lat.to_string()))?;
    let lon: f64 = lon.parse().map_err(|_| ParseError::BadNumber(lon.to_string()))?;
    Coordinate::new(lat, lon).map_err(|err| ParseError::BadCoordinate(err.to_string()))
}

/// Runs until `quit` or end of input
pub fn run<R, W>(
    controller: &mut MapController,
    completions: Receiver<Completion>,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let lines = spawn_reader(input)?;
    writeln!(out, "Type \"help\" for commands.")?;
    writeln!(out, "{}", controller.status_text())?;

    loop {
        select! {
            recv(lines) -> line => {
                let Ok(line) = line else {
                    // End of input: an outstanding prompt counts as dismissed
                    if controller.state().pending_prompt().is_some() {
                        let commands = controller.answer_prompt(None);
                        present(controller, commands, out)?;
                    }
                    break;
                };

                if controller.state().pending_prompt().is_some() {
                    let commands = controller.answer_prompt(Some(line));
                    present(controller, commands, out)?;
                    continue;
                }

                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        let commands = execute(controller, command, out)?;
                        present(controller, commands, out)?;
                    }
                    Err(ParseError::Empty) => {}
                    Err(err) => writeln!(out, "{err}")?,
                }
            }
            recv(completions) -> completion => {
                match completion {
                    Ok(completion) => {
                        let commands = controller.handle_completion(completion);
                        present(controller, commands, out)?;
                    }
                    Err(_) => {
                        log::warn!("Dispatcher stopped, background work is no longer possible");
                        break;
                    }
                }
            }
        }
    }

    finish(controller, &completions, out)
}

/// Lets in-flight jobs finish and reports their results
fn finish<W: Write>(
    controller: &mut MapController,
    completions: &Receiver<Completion>,
    out: &mut W,
) -> io::Result<()> {
    controller.finish();
    for completion in completions.try_iter() {
        let commands = controller.handle_completion(completion);
        present(controller, commands, out)?;
    }
    Ok(())
}

fn spawn_reader<R>(input: R) -> io::Result<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("map-prompt-stdin".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::error!("Failed to read input: {}", err);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn execute<W: Write>(
    controller: &mut MapController,
    command: ConsoleCommand,
    out: &mut W,
) -> io::Result<Vec<ShellCommand>> {
    let step = controller.radius_step();
    let intent = match command {
        ConsoleCommand::Search(city) => Some(Intent::Search(city)),
        ConsoleCommand::Select => button_intent(Control::Select, step, ""),
        ConsoleCommand::Move(coord) => Some(Intent::PointerMoved(coord)),
        ConsoleCommand::Leave => Some(Intent::PointerLeft),
        ConsoleCommand::Click(coord) => Some(Intent::MapClicked(coord)),
        ConsoleCommand::Key(key) => key_intent(key, step),
        ConsoleCommand::Button(control) => button_intent(control, step, ""),
        ConsoleCommand::Zoom(levels) => {
            let (width, height) = controller.viewport().size();
            Some(Intent::Zoom {
                delta: levels,
                x: width / 2.0,
                y: height / 2.0,
            })
        }
        ConsoleCommand::State => {
            writeln!(out, "{}", controller.status_text())?;
            if let Some(preview) = controller.state().preview_center() {
                writeln!(out, "Preview circle at {}", preview)?;
            }
            None
        }
        ConsoleCommand::Help => {
            writeln!(out, "{HELP}")?;
            None
        }
        ConsoleCommand::Quit => None,
    };

    Ok(intent
        .map(|intent| controller.handle_intent(intent))
        .unwrap_or_default())
}

fn present<W: Write>(
    controller: &MapController,
    commands: Vec<ShellCommand>,
    out: &mut W,
) -> io::Result<()> {
    let mut redraw = false;
    for command in commands {
        match command {
            ShellCommand::Alert(message) => writeln!(out, "! {message}")?,
            ShellCommand::AskPrompt(pending) => {
                writeln!(
                    out,
                    "{} {} within {}",
                    pending.origin.label(),
                    pending.coordinate,
                    pending.radius
                )?;
                write!(out, "{PROMPT_MESSAGE} ")?;
                out.flush()?;
            }
            ShellCommand::Redraw => redraw = true,
        }
    }
    if redraw && controller.state().pending_prompt().is_none() {
        writeln!(out, "{}", controller.status_text())?;
    }
    Ok(())
}
