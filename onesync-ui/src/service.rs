use std::path::PathBuf;

use anyhow::{Context, Result};
use onesync_core::{ConnectionStatus, ModificationTime, StatusCode, WebDavClient, WebDavError};
use tokio::runtime::{Builder, Runtime};

use crate::local_fs::{self, CopyError};
use crate::settings::SyncTarget;

/// Everything the shell can ask for. Each call blocks until its single
/// request or filesystem operation finishes.
pub trait SyncService {
    fn check_connectivity(&self, target: &SyncTarget) -> ConnectionStatus;

    fn remote_modification_time(&self, target: &SyncTarget) -> ModificationTime;

    fn local_modification_time(&self, target: &SyncTarget) -> ModificationTime {
        local_fs::local_modification_time(&target.local_sync_path)
    }

    fn download(&self, target: &SyncTarget) -> Result<u64, WebDavError>;

    fn upload(&self, target: &SyncTarget) -> Result<StatusCode, WebDavError>;

    fn copy_to_folder(&self, target: &SyncTarget) -> Result<PathBuf, CopyError> {
        local_fs::copy_to_folder(
            &target.local_sync_path,
            &target.destination_folder,
            &target.name_of_file,
        )
    }
}

/// [`SyncService`] backed by the WebDAV client, driven on a private
/// current-thread runtime.
pub struct WebDavSyncService {
    client: WebDavClient,
    runtime: Runtime,
}

impl WebDavSyncService {
    pub fn new(client: WebDavClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start I/O runtime")?;
        Ok(Self { client, runtime })
    }
}

impl SyncService for WebDavSyncService {
    fn check_connectivity(&self, target: &SyncTarget) -> ConnectionStatus {
        self.runtime.block_on(
            self.client
                .check_connectivity(&target.server_url, &target.credentials),
        )
    }

    fn remote_modification_time(&self, target: &SyncTarget) -> ModificationTime {
        self.runtime.block_on(
            self.client
                .remote_modification_time(&target.remote_file_url, &target.credentials),
        )
    }

    fn download(&self, target: &SyncTarget) -> Result<u64, WebDavError> {
        self.runtime.block_on(self.client.download(
            &target.remote_file_url,
            &target.credentials,
            &target.local_sync_path,
        ))
    }

    fn upload(&self, target: &SyncTarget) -> Result<StatusCode, WebDavError> {
        self.runtime.block_on(self.client.upload(
            &target.remote_file_url,
            &target.credentials,
            &target.local_sync_path,
        ))
    }
}
