use anyhow::Result;
use onesync_core::{DisplayZone, Timeouts, WebDavClient, WebDavError};
use tracing::{info, warn};

use crate::service::{SyncService, WebDavSyncService};
use crate::settings::{ConfigStore, Settings, SyncTarget, display_zone_from_env};
use crate::ui_model::{Notice, StatusModel};

/// Application state shared by the CLI, the text shell and the GTK window.
///
/// Settings are only changed through [`App::apply_settings`], which also
/// rebuilds the derived [`SyncTarget`].
pub struct App {
    store: ConfigStore,
    settings: Settings,
    target: SyncTarget,
    zone: DisplayZone,
    service: Box<dyn SyncService>,
    status: StatusModel,
}

impl App {
    pub fn new(
        store: ConfigStore,
        settings: Settings,
        service: Box<dyn SyncService>,
        zone: DisplayZone,
    ) -> Self {
        let target = settings.target();
        Self {
            store,
            settings,
            target,
            zone,
            service,
            status: StatusModel::default(),
        }
    }

    /// Loads settings from the environment's config file and wires the
    /// WebDAV-backed service.
    pub fn bootstrap() -> Result<Self> {
        let store = ConfigStore::from_env();
        let settings = store.load();
        let zone = display_zone_from_env();
        let client = WebDavClient::with_settings(Timeouts::default(), zone.clone());
        let service = WebDavSyncService::new(client)?;
        Ok(Self::new(store, settings, Box::new(service), zone))
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub fn zone(&self) -> &DisplayZone {
        &self.zone
    }

    pub fn status(&self) -> &StatusModel {
        &self.status
    }

    /// Connection probe followed by both timestamp probes.
    pub fn startup(&mut self) -> Option<Notice> {
        let notice = self.check_connection();
        self.recheck();
        notice
    }

    pub fn check_connection(&mut self) -> Option<Notice> {
        info!(
            url = %self.settings.webdav_url,
            folder = %self.settings.webdav_folder,
            username = %self.settings.username,
            "Checking WebDAV connection"
        );
        let status = self.service.check_connectivity(&self.target);
        let notice = (!status.reachable).then(|| {
            Notice::error(
                "WebDAV Connection",
                format!("Failed to connect to WebDAV server. {}", status.detail),
            )
        });
        self.status.connection = Some(status);
        notice
    }

    pub fn recheck(&mut self) {
        self.status.remote = Some(self.service.remote_modification_time(&self.target));
        self.status.local = Some(self.service.local_modification_time(&self.target));
    }

    pub fn download(&mut self) -> Notice {
        let name = &self.target.name_of_file;
        match self.service.download(&self.target) {
            Ok(bytes) => {
                info!(path = %self.target.local_sync_path.display(), bytes, "Downloaded from WebDAV");
                Notice::info("Sync", format!("Downloaded {name} from WebDAV."))
            }
            Err(WebDavError::Status { status }) => {
                warn!(status = status.as_u16(), "Download rejected");
                Notice::error(
                    "Sync",
                    format!(
                        "Failed to download {name}. Status code: {}",
                        status.as_u16()
                    ),
                )
            }
            Err(err) => Notice::error("Sync", format!("Error downloading file: {err}")),
        }
    }

    pub fn upload(&mut self) -> Notice {
        let name = &self.target.name_of_file;
        match self.service.upload(&self.target) {
            Ok(status) => {
                info!(status = status.as_u16(), "Uploaded to WebDAV");
                Notice::info("Sync", format!("Uploaded {name} to WebDAV."))
            }
            Err(WebDavError::LocalFileMissing(path)) => Notice::error(
                "Sync",
                format!("Local file does not exist: {}", path.display()),
            ),
            Err(WebDavError::Status { status }) => {
                warn!(status = status.as_u16(), "Upload rejected");
                Notice::error(
                    "Sync",
                    format!("Failed to upload {name}. Status code: {}", status.as_u16()),
                )
            }
            Err(err) => Notice::error("Sync", format!("Error uploading file: {err}")),
        }
    }

    pub fn copy_to_folder(&mut self) -> Notice {
        match self.service.copy_to_folder(&self.target) {
            Ok(destination) => {
                Notice::info("Copy File", format!("File copied to {}", destination.display()))
            }
            Err(err) => Notice::error("Error", err.to_string()),
        }
    }

    /// Replaces the settings, recomputes derived paths and persists them.
    pub fn apply_settings(&mut self, settings: Settings) -> Notice {
        self.settings = settings;
        self.target = self.settings.target();
        match self.store.save(&self.settings) {
            Ok(()) => Notice::info("Config", "Configuration saved successfully!"),
            Err(err) => Notice::error("Config", format!("Failed to save configuration: {err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use std::rc::Rc;

    use onesync_core::{ConnectionStatus, ModificationTime, StatusCode};
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ui_model::NoticeLevel;

    #[derive(Clone, Copy)]
    enum Outcome {
        Ok,
        Status(u16),
        Missing,
        Transport,
    }

    struct FakeService {
        reachable: bool,
        outcome: Outcome,
        urls: Rc<RefCell<Vec<String>>>,
    }

    impl FakeService {
        fn failure(&self, target: &SyncTarget) -> Option<WebDavError> {
            match self.outcome {
                Outcome::Ok => None,
                Outcome::Status(code) => Some(WebDavError::Status {
                    status: StatusCode::from_u16(code).unwrap(),
                }),
                Outcome::Missing => Some(WebDavError::LocalFileMissing(
                    target.local_sync_path.clone(),
                )),
                Outcome::Transport => Some(WebDavError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
            }
        }
    }

    impl SyncService for FakeService {
        fn check_connectivity(&self, target: &SyncTarget) -> ConnectionStatus {
            self.urls.borrow_mut().push(target.server_url.clone());
            if self.reachable {
                ConnectionStatus::connected()
            } else {
                ConnectionStatus::failed("Status code: 503")
            }
        }

        fn remote_modification_time(&self, target: &SyncTarget) -> ModificationTime {
            self.urls.borrow_mut().push(target.remote_file_url.clone());
            ModificationTime::Unavailable
        }

        fn local_modification_time(&self, _target: &SyncTarget) -> ModificationTime {
            ModificationTime::FileNotFound
        }

        fn download(&self, target: &SyncTarget) -> Result<u64, WebDavError> {
            self.urls.borrow_mut().push(target.remote_file_url.clone());
            self.failure(target).map_or(Ok(2), Err)
        }

        fn upload(&self, target: &SyncTarget) -> Result<StatusCode, WebDavError> {
            self.urls.borrow_mut().push(target.remote_file_url.clone());
            self.failure(target).map_or(Ok(StatusCode::CREATED), Err)
        }
    }

    fn fake_app(
        store: ConfigStore,
        reachable: bool,
        outcome: Outcome,
    ) -> (App, Rc<RefCell<Vec<String>>>) {
        let urls = Rc::new(RefCell::new(Vec::new()));
        let service = FakeService {
            reachable,
            outcome,
            urls: Rc::clone(&urls),
        };
        let app = App::new(
            store,
            Settings::default(),
            Box::new(service),
            DisplayZone::default(),
        );
        (app, urls)
    }

    fn scratch_store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        (dir, store)
    }

    #[test]
    fn startup_probes_everything_and_reports_unreachable_server() {
        let (_dir, store) = scratch_store();
        let (mut app, urls) = fake_app(store, false, Outcome::Ok);

        let notice = app.startup().expect("unreachable server raises a notice");

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.message,
            "Failed to connect to WebDAV server. Status code: 503"
        );
        assert_eq!(app.status().connection_label(), "WebDAV unreachable");
        assert_eq!(app.status().remote_label(), "Remote file date: Unavailable");
        assert_eq!(app.status().local_label(), "Local file date: File not found");
        assert_eq!(
            *urls.borrow(),
            [
                "https://webdav.yandex.ru/".to_string(),
                "https://webdav.yandex.ru/Tabby/config.yaml".to_string()
            ]
        );
    }

    #[test]
    fn reachable_server_raises_no_notice() {
        let (_dir, store) = scratch_store();
        let (mut app, _) = fake_app(store, true, Outcome::Ok);
        assert!(app.check_connection().is_none());
        assert_eq!(app.status().connection_label(), "WebDAV connected");
    }

    #[test]
    fn download_notices_follow_outcome() {
        let (_dir, store) = scratch_store();
        let (mut app, _) = fake_app(store.clone(), true, Outcome::Ok);
        assert_eq!(
            app.download(),
            Notice::info("Sync", "Downloaded config.yaml from WebDAV.")
        );

        let (mut app, _) = fake_app(store.clone(), true, Outcome::Status(404));
        assert_eq!(
            app.download(),
            Notice::error("Sync", "Failed to download config.yaml. Status code: 404")
        );

        let (mut app, _) = fake_app(store, true, Outcome::Transport);
        let notice = app.download();
        assert!(notice.is_error());
        assert!(notice.message.starts_with("Error downloading file: "));
    }

    #[test]
    fn upload_notices_follow_outcome() {
        let (_dir, store) = scratch_store();
        let (mut app, _) = fake_app(store.clone(), true, Outcome::Ok);
        assert_eq!(
            app.upload(),
            Notice::info("Sync", "Uploaded config.yaml to WebDAV.")
        );

        let (mut app, _) = fake_app(store.clone(), true, Outcome::Missing);
        assert_eq!(
            app.upload(),
            Notice::error("Sync", "Local file does not exist: config.yaml")
        );

        let (mut app, _) = fake_app(store.clone(), true, Outcome::Status(507));
        assert_eq!(
            app.upload(),
            Notice::error("Sync", "Failed to upload config.yaml. Status code: 507")
        );

        let (mut app, _) = fake_app(store, true, Outcome::Transport);
        assert!(app.upload().message.starts_with("Error uploading file: "));
    }

    #[test]
    fn apply_settings_persists_and_retargets() {
        let (_dir, store) = scratch_store();
        let (mut app, urls) = fake_app(store.clone(), true, Outcome::Ok);

        let mut updated = app.settings().clone();
        updated.webdav_url = "https://dav.example.org".to_string();
        updated.webdav_folder = "Notes/".to_string();
        updated.name_of_file = "todo.txt".to_string();
        let notice = app.apply_settings(updated.clone());

        assert_eq!(
            notice,
            Notice::info("Config", "Configuration saved successfully!")
        );
        assert_eq!(store.load(), updated);
        assert_eq!(
            app.target().remote_file_url,
            "https://dav.example.org/Notes/todo.txt"
        );

        app.download();
        assert_eq!(
            urls.borrow().last().map(String::as_str),
            Some("https://dav.example.org/Notes/todo.txt")
        );
    }

    #[test]
    fn copy_notice_reports_missing_destination() {
        let (dir, store) = scratch_store();
        let (mut app, _) = fake_app(store, true, Outcome::Ok);
        let mut settings = app.settings().clone();
        settings.path_to_file = dir.path().display().to_string();
        fs::write(dir.path().join("config.yaml"), b"x").unwrap();
        app.apply_settings(settings);

        let notice = app.copy_to_folder();
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.message, "Destination folder does not exist: ");

        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let mut settings = app.settings().clone();
        settings.destination_folder = dest.display().to_string();
        app.apply_settings(settings);

        let notice = app.copy_to_folder();
        assert_eq!(
            notice,
            Notice::info(
                "Copy File",
                format!("File copied to {}", dest.join("config.yaml").display())
            )
        );
    }

    #[test]
    fn download_scenario_against_webdav_server() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("HEAD"))
                .and(path("/"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
            Mock::given(method("HEAD"))
                .and(path("/Tabby/config.yaml"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("Last-Modified", "Mon, 01 Jan 2024 12:00:00 GMT"),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/Tabby/config.yaml"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"v2"))
                .mount(&server)
                .await;
            server
        });

        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        let mut settings = Settings::default();
        settings.webdav_url = format!("{}/", server.uri());
        settings.path_to_file = dir.path().join("tabby").display().to_string();
        let service = WebDavSyncService::new(WebDavClient::new()).unwrap();
        let mut app = App::new(store, settings, Box::new(service), DisplayZone::default());

        assert!(app.startup().is_none());
        assert_eq!(app.status().connection_label(), "WebDAV connected");
        assert_eq!(
            app.status().remote_label(),
            "Remote file date: 2024-01-01 15:00:00"
        );
        assert_eq!(app.status().local_label(), "Local file date: File not found");

        let notice = app.download();
        assert_eq!(
            notice,
            Notice::info("Sync", "Downloaded config.yaml from WebDAV.")
        );
        let local = dir.path().join("tabby/config.yaml");
        assert_eq!(fs::read(&local).unwrap(), b"v2");

        app.recheck();
        assert!(app.status().local.is_some_and(|time| time.is_known()));
        assert_eq!(
            app.status().remote_label(),
            "Remote file date: 2024-01-01 15:00:00"
        );
    }

    #[test]
    fn upload_without_local_file_makes_no_request() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(201))
                .expect(0)
                .mount(&server)
                .await;
            server
        });

        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.webdav_url = server.uri();
        settings.path_to_file = dir.path().display().to_string();
        let service = WebDavSyncService::new(WebDavClient::new()).unwrap();
        let mut app = App::new(
            ConfigStore::new(dir.path().join("config.toml")),
            settings,
            Box::new(service),
            DisplayZone::default(),
        );

        let notice = app.upload();
        assert!(notice.is_error());
        assert!(notice.message.starts_with("Local file does not exist: "));
        runtime.block_on(server.verify());
    }
}
