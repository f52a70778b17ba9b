//! Hook for the step that turns a pending upload into a result folder.
//!
//! The transformation itself lives outside this crate. The server only
//! notifies a [`ResultProducer`] once an upload has been stored.

use crate::store::PendingUpload;
use log::info;

/// Receives every successfully stored upload
pub trait ResultProducer: Send + Sync {
    fn on_upload(&self, upload: &PendingUpload);
}

/// Producer that only records the upload in the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingProducer;

impl ResultProducer for LoggingProducer {
    fn on_upload(&self, upload: &PendingUpload) {
        info!(
            "Upload {} ({} bytes) is pending processing",
            upload.filename, upload.size
        );
    }
}
