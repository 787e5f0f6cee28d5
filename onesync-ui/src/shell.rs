use std::io::{BufRead, Write};

use anyhow::Result;

use crate::app::App;
use crate::settings::Settings;
use crate::ui_model::{Notice, NoticeLevel};

const CLEAR_ANSWER: &str = "-";

const MENU: [(&str, &str); 7] = [
    ("1", "Sync from remote"),
    ("2", "Sync to remote"),
    ("3", "Recheck"),
    ("4", "Configure WebDAV Options"),
    ("5", "Check WebDAV Connection"),
    ("6", "Copy File to Folder"),
    ("q", "Quit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellCommand {
    Download,
    Upload,
    Recheck,
    Configure,
    CheckConnection,
    Copy,
    Quit,
}

fn parse_command(input: &str) -> Option<ShellCommand> {
    let command = match input.trim().to_ascii_lowercase().as_str() {
        "1" | "download" => ShellCommand::Download,
        "2" | "upload" => ShellCommand::Upload,
        "3" | "recheck" => ShellCommand::Recheck,
        "4" | "configure" => ShellCommand::Configure,
        "5" | "check" => ShellCommand::CheckConnection,
        "6" | "copy" => ShellCommand::Copy,
        "q" | "quit" | "exit" => ShellCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Menu-driven terminal front end exposing the same six actions as the
/// window. Runs until `q` or end of input.
pub fn run<R: BufRead, W: Write>(app: &mut App, input: &mut R, output: &mut W) -> Result<()> {
    if let Some(notice) = app.startup() {
        write_notice(output, &notice)?;
    }
    loop {
        write_status(output, app)?;
        for (key, label) in MENU {
            writeln!(output, "  [{key}] {label}")?;
        }
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let Some(command) = parse_command(&line) else {
            writeln!(output, "Unknown choice: {}", line.trim())?;
            continue;
        };
        let notice = match command {
            ShellCommand::Download => Some(app.download()),
            ShellCommand::Upload => Some(app.upload()),
            ShellCommand::Recheck => {
                app.recheck();
                None
            }
            ShellCommand::Configure => {
                let updated = prompt_settings(app.settings(), input, output)?;
                Some(app.apply_settings(updated))
            }
            ShellCommand::CheckConnection => app.check_connection(),
            ShellCommand::Copy => Some(app.copy_to_folder()),
            ShellCommand::Quit => return Ok(()),
        };
        if let Some(notice) = notice {
            write_notice(output, &notice)?;
        }
    }
}

/// Asks for every setting, showing the current value. An empty answer keeps
/// it and a lone `-` clears it.
pub fn prompt_settings<R: BufRead, W: Write>(
    current: &Settings,
    input: &mut R,
    output: &mut W,
) -> Result<Settings> {
    let mut updated = current.clone();
    writeln!(output, "Enter keeps a value, {CLEAR_ANSWER} clears it.")?;
    for (key, value) in current.fields() {
        let shown = if key == "password" && !value.is_empty() {
            "***"
        } else {
            value.as_str()
        };
        write!(output, "{} [{shown}]: ", Settings::label(key))?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim_end_matches(['\r', '\n']) {
            "" => {}
            CLEAR_ANSWER => updated.set(key, "")?,
            answer => updated.set(key, answer)?,
        }
    }
    Ok(updated)
}

fn write_status<W: Write>(output: &mut W, app: &App) -> Result<()> {
    let status = app.status();
    writeln!(output)?;
    writeln!(output, "{}", status.connection_label())?;
    writeln!(output, "{}", status.local_label())?;
    writeln!(output, "{}", status.remote_label())?;
    Ok(())
}

fn write_notice<W: Write>(output: &mut W, notice: &Notice) -> Result<()> {
    let marker = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    writeln!(output, "[{marker}] {}: {}", notice.title, notice.message)?;
    Ok(())
}
