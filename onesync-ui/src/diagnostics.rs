use anyhow::Result;
use onesync_core::{ConnectionStatus, ModificationTime};
use serde::Serialize;

use crate::app::App;
use crate::settings::SettingsSnapshot;

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub connection: Option<ConnectionStatus>,
    pub local_file_date: Option<String>,
    pub remote_file_date: Option<String>,
    pub in_sync: Option<bool>,
    pub settings: SettingsSnapshot,
}

impl DiagnosticsReport {
    pub fn collect(app: &App) -> Self {
        let status = app.status();
        let in_sync = match (
            status.local.and_then(|time| time.as_datetime()),
            status.remote.and_then(|time| time.as_datetime()),
        ) {
            (Some(local), Some(remote)) => Some(local.timestamp() == remote.timestamp()),
            _ => None,
        };
        Self {
            connection: status.connection.clone(),
            local_file_date: status.local.as_ref().map(ModificationTime::to_string),
            remote_file_date: status.remote.as_ref().map(ModificationTime::to_string),
            in_sync,
            settings: SettingsSnapshot::new(app.store(), app.settings(), app.zone()),
        }
    }
}

pub fn print_diagnostics_report(app: &App) -> Result<()> {
    let report = DiagnosticsReport::collect(app);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
