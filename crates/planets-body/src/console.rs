//! Interactive parameter editing over a line-based console.
//!
//! Runs on its own thread and only touches parameters through
//! [`ParameterGroup`](crate::params::ParameterGroup) locks.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::params::{PARAMETER_NAMES, ParameterManager};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    List,
    Show { group: String },
    Set { group: String, index: usize, value: f32 },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a valid {1}")]
    BadNumber(String, &'static str),
}

const SET_USAGE: &str = "set <group> <index> <value>";
const SHOW_USAGE: &str = "show <group>";

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("q" | "quit" | "exit", []) => ConsoleCommand::Quit,
        ("list" | "ls", []) => ConsoleCommand::List,
        ("help" | "?", []) => ConsoleCommand::Help,
        ("show", [group]) => ConsoleCommand::Show {
            group: group.to_string(),
        },
        ("show", _) => return Err(CommandError::Usage(SHOW_USAGE)),
        ("set", [group, index, value]) => ConsoleCommand::Set {
            group: group.to_string(),
            index: index
                .parse()
                .map_err(|_| CommandError::BadNumber(index.to_string(), "index"))?,
            value: value
                .parse()
                .map_err(|_| CommandError::BadNumber(value.to_string(), "value"))?,
        },
        ("set", _) => return Err(CommandError::Usage(SET_USAGE)),
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Run the console loop until `quit` or end of input.
pub fn run_console<R: BufRead, W: Write>(
    manager: &ParameterManager,
    reader: R,
    mut out: W,
) -> io::Result<()> {
    writeln!(out, "Parameter console: type 'help' for commands")?;
    for line in reader.lines() {
        match parse_command(&line?) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => execute(manager, &command, &mut out)?,
            Err(err) => writeln!(out, "{err}")?,
        }
        out.flush()?;
    }
    tracing::debug!("parameter console finished");
    Ok(())
}

/// Spawn [`run_console`] on a named thread.
pub fn spawn_console<R, W>(
    manager: Arc<ParameterManager>,
    reader: R,
    out: W,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("parameter-console".into())
        .spawn(move || {
            if let Err(err) = run_console(&manager, reader, out) {
                tracing::warn!(error = %err, "parameter console stopped");
            }
        })
}

fn execute<W: Write>(
    manager: &ParameterManager,
    command: &ConsoleCommand,
    out: &mut W,
) -> io::Result<()> {
    match command {
        ConsoleCommand::List => {
            for name in manager.names() {
                writeln!(out, "{name}")?;
            }
        }
        ConsoleCommand::Help => {
            writeln!(out, "list | show <group> | {SET_USAGE} | q")?;
        }
        ConsoleCommand::Show { group } => match manager.group(group) {
            Some(group) => {
                let snapshot = group.snapshot();
                writeln!(out, "{} (version {})", group.name(), snapshot.version)?;
                for (i, value) in snapshot.values.iter().enumerate() {
                    let label = PARAMETER_NAMES.get(i).copied().unwrap_or("extra");
                    writeln!(out, "  [{i}] {label}: {value}")?;
                }
            }
            None => writeln!(out, "no group named '{group}'")?,
        },
        ConsoleCommand::Set {
            group,
            index,
            value,
        } => match manager.group(group) {
            Some(target) => match target.set(*index, *value) {
                Ok(changed) => {
                    tracing::info!(group = %group, index, value, changed, "parameter set");
                    writeln!(out, "{group}[{index}] = {value}")?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            None => writeln!(out, "no group named '{group}'")?,
        },
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterGroup;
    use std::io::Cursor;

    fn manager() -> ParameterManager {
        let manager = ParameterManager::new();
        manager.insert(ParameterGroup::new("Moon", vec![100.0, 10.0, 0.3]).unwrap());
        manager
    }

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("q"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(parse_command("list"), Ok(Some(ConsoleCommand::List)));
        assert_eq!(
            parse_command("show Moon"),
            Ok(Some(ConsoleCommand::Show {
                group: "Moon".into()
            }))
        );
        assert_eq!(
            parse_command("set Moon 2 0.25"),
            Ok(Some(ConsoleCommand::Set {
                group: "Moon".into(),
                index: 2,
                value: 0.25
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("fly"),
            Err(CommandError::Unknown("fly".into()))
        );
        assert_eq!(parse_command("set Moon 1"), Err(CommandError::Usage(SET_USAGE)));
        assert_eq!(
            parse_command("set Moon x 1"),
            Err(CommandError::BadNumber("x".into(), "index"))
        );
        assert_eq!(
            parse_command("set Moon 1 lots"),
            Err(CommandError::BadNumber("lots".into(), "value"))
        );
    }

    #[test]
    fn test_console_session_updates_group() {
        let manager = manager();
        let input = Cursor::new("show Moon\nset Moon 0 250\nbogus\nq\nset Moon 0 1\n");
        let mut out = Vec::new();
        run_console(&manager, input, &mut out).unwrap();

        let group = manager.group("Moon").unwrap();
        assert_eq!(group.get(0), Some(250.0));
        assert_eq!(group.version(), 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[2] max texture radius: 0.3"));
        assert!(text.contains("Moon[0] = 250"));
        assert!(text.contains("unknown command 'bogus'"));
    }

    #[test]
    fn test_console_reports_bad_targets() {
        let manager = manager();
        let input = Cursor::new("set Sun 0 1\nset Moon 9 1\n");
        let mut out = Vec::new();
        run_console(&manager, input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("no group named 'Sun'"));
        assert!(text.contains("index 9 is out of range"));
    }

    #[test]
    fn test_spawned_console_ends_at_eof() {
        let manager = Arc::new(manager());
        let handle = spawn_console(
            Arc::clone(&manager),
            Cursor::new("set Moon 1 3\n"),
            io::sink(),
        )
        .unwrap();
        handle.join().unwrap();
        assert_eq!(manager.group("Moon").unwrap().get(1), Some(3.0));
    }
}
