mod client;
mod remote_url;
mod timestamp;

pub use client::{
    ConnectionStatus, Credentials, STATUS_TIMEOUT, TRANSFER_TIMEOUT, Timeouts, WebDavClient,
    WebDavError,
};
pub use remote_url::remote_file_url;
pub use timestamp::{DisplayZone, ModificationTime};

pub use reqwest::StatusCode;
