mod app;
mod diagnostics;
#[cfg(feature = "gtk-ui")]
mod gtk_app;
mod local_fs;
mod service;
mod settings;
mod shell;
mod ui_model;

use std::io::{self, Write};

use app::App;
use diagnostics::print_diagnostics_report;
use settings::SettingsSnapshot;
use tracing_subscriber::EnvFilter;
use ui_model::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Status,
    Download,
    Upload,
    Recheck,
    CheckConnection,
    Copy,
    Configure,
    Set,
    ShowSettings,
    Diagnostics,
    Shell,
    Gtk,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cli {
    mode: CliMode,
    assignments: Vec<(String, String)>,
}

fn parse_cli<I>(args: I) -> anyhow::Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = default_cli_mode();
    let mut assignments = Vec::new();
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        mode = match arg.as_str() {
            "--status" => CliMode::Status,
            "--download" => CliMode::Download,
            "--upload" => CliMode::Upload,
            "--recheck" => CliMode::Recheck,
            "--check-connection" => CliMode::CheckConnection,
            "--copy" => CliMode::Copy,
            "--configure" => CliMode::Configure,
            "--set" => {
                let Some(pair) = args.next() else {
                    anyhow::bail!("--set expects key=value");
                };
                let Some((key, value)) = pair.split_once('=') else {
                    anyhow::bail!("--set expects key=value, got: {pair}");
                };
                assignments.push((key.trim().to_string(), value.to_string()));
                CliMode::Set
            }
            "--show-settings" => CliMode::ShowSettings,
            "--diagnostics" => CliMode::Diagnostics,
            "--shell" => CliMode::Shell,
            "--gtk" => CliMode::Gtk,
            "--help" | "-h" => {
                print_help();
                return Ok(Cli {
                    mode: CliMode::Help,
                    assignments,
                });
            }
            other => anyhow::bail!("unknown argument: {other}"),
        };
    }
    Ok(Cli { mode, assignments })
}

#[cfg(feature = "gtk-ui")]
fn default_cli_mode() -> CliMode {
    CliMode::Gtk
}

#[cfg(not(feature = "gtk-ui"))]
fn default_cli_mode() -> CliMode {
    CliMode::Status
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = parse_cli(std::env::args())?;
    if cli.mode == CliMode::Help {
        return Ok(());
    }

    let mut app = App::bootstrap()?;
    match cli.mode {
        CliMode::Gtk => launch_gtk(app),
        CliMode::Status => {
            if let Some(notice) = app.startup() {
                eprintln!("{}: {}", notice.title, notice.message);
            }
            print_status(&app);
            Ok(())
        }
        CliMode::Recheck => {
            app.recheck();
            print_status(&app);
            Ok(())
        }
        CliMode::CheckConnection => {
            let notice = app.check_connection();
            println!("{}", app.status().connection_label());
            notice.map_or(Ok(()), emit)
        }
        CliMode::Download => emit(app.download()),
        CliMode::Upload => emit(app.upload()),
        CliMode::Copy => emit(app.copy_to_folder()),
        CliMode::Configure => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            let updated = shell::prompt_settings(app.settings(), &mut input, &mut output)?;
            emit(app.apply_settings(updated))
        }
        CliMode::Set => {
            let mut updated = app.settings().clone();
            for (key, value) in cli.assignments {
                updated.set(&key, value)?;
            }
            emit(app.apply_settings(updated))
        }
        CliMode::ShowSettings => {
            let snapshot = SettingsSnapshot::new(app.store(), app.settings(), app.zone());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        CliMode::Diagnostics => {
            app.startup();
            print_diagnostics_report(&app)
        }
        CliMode::Shell => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            shell::run(&mut app, &mut input, &mut output)?;
            output.flush()?;
            Ok(())
        }
        CliMode::Help => unreachable!("help mode returns early"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_status(app: &App) {
    let status = app.status();
    if status.connection.is_some() {
        println!("{}", status.connection_label());
    }
    println!("{}", status.local_label());
    println!("{}", status.remote_label());
}

/// Info notices go to stdout; error notices become the process error.
fn emit(notice: Notice) -> anyhow::Result<()> {
    if notice.is_error() {
        anyhow::bail!("{}: {}", notice.title, notice.message);
    }
    println!("{}: {}", notice.title, notice.message);
    Ok(())
}

fn print_help() {
    println!(
        "Usage: onesync-ui [--status | --download | --upload | --recheck | --check-connection | --copy | --configure | --set key=value ... | --show-settings | --diagnostics | --shell | --gtk]\n\
         Settings file: $ONESYNC_CONFIG or <config dir>/onesync/config.toml\n\
         Remote dates are shown in Europe/Moscow unless $ONESYNC_DISPLAY_ZONE names another zone or +HH:MM offset\n\
         (note: in a build with the gtk-ui feature and no flags, the window starts)"
    );
}

#[cfg(feature = "gtk-ui")]
fn launch_gtk(app: App) -> anyhow::Result<()> {
    gtk_app::run(app)
}

#[cfg(not(feature = "gtk-ui"))]
fn launch_gtk(_app: App) -> anyhow::Result<()> {
    anyhow::bail!("GTK UI is not enabled in this build. Rebuild with --features gtk-ui.")
}
