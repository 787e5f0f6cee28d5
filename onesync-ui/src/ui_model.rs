use onesync_core::{ConnectionStatus, ModificationTime};

const CHECKING: &str = "Checking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiStatus {
    Unknown,
    Ready,
    Error,
}

/// What the status labels show. `None` means the probe has not run yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusModel {
    pub connection: Option<ConnectionStatus>,
    pub local: Option<ModificationTime>,
    pub remote: Option<ModificationTime>,
}

impl StatusModel {
    pub fn connection_status(&self) -> UiStatus {
        match &self.connection {
            Some(status) if status.reachable => UiStatus::Ready,
            Some(_) => UiStatus::Error,
            None => UiStatus::Unknown,
        }
    }

    pub fn connection_label(&self) -> String {
        match self.connection_status() {
            UiStatus::Ready => "WebDAV connected".to_string(),
            UiStatus::Error => "WebDAV unreachable".to_string(),
            UiStatus::Unknown => "Checking WebDAV connection...".to_string(),
        }
    }

    pub fn local_label(&self) -> String {
        format!("Local file date: {}", render(self.local.as_ref()))
    }

    pub fn remote_label(&self) -> String {
        format!("Remote file date: {}", render(self.remote.as_ref()))
    }
}

fn render(time: Option<&ModificationTime>) -> String {
    time.map_or_else(|| CHECKING.to_string(), ToString::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Outcome of a user action, shown as a modal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_before_first_probe() {
        let model = StatusModel::default();
        assert_eq!(model.connection_status(), UiStatus::Unknown);
        assert_eq!(model.connection_label(), "Checking WebDAV connection...");
        assert_eq!(model.local_label(), "Local file date: Checking...");
        assert_eq!(model.remote_label(), "Remote file date: Checking...");
    }

    #[test]
    fn maps_connection_status() {
        let mut model = StatusModel {
            connection: Some(ConnectionStatus::connected()),
            ..StatusModel::default()
        };
        assert_eq!(model.connection_status(), UiStatus::Ready);
        assert_eq!(model.connection_label(), "WebDAV connected");

        model.connection = Some(ConnectionStatus::failed("Status code: 503"));
        assert_eq!(model.connection_status(), UiStatus::Error);
        assert_eq!(model.connection_label(), "WebDAV unreachable");
    }

    #[test]
    fn sentinel_labels_render_as_text() {
        let model = StatusModel {
            connection: None,
            local: Some(ModificationTime::FileNotFound),
            remote: Some(ModificationTime::ParseError),
        };
        assert_eq!(model.local_label(), "Local file date: File not found");
        assert_eq!(model.remote_label(), "Remote file date: Parse error");
    }
}
