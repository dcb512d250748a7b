use std::path::Path;
use tspub_core::models::FileId;
use tspub_core::PublishResult;

use crate::poller::UploadStatusPoller;
use crate::uploader::ObjectUploader;

/// Upload path of one local file: store the object, register it and wait
/// for the remote file id.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    uploader: ObjectUploader,
    poller: UploadStatusPoller,
}

impl FileTransfer {
    pub fn new(uploader: ObjectUploader, poller: UploadStatusPoller) -> Self {
        Self { uploader, poller }
    }

    pub async fn transfer(&self, source: &Path) -> PublishResult<FileId> {
        let key = self.uploader.upload(source).await?;
        self.poller.process(source, &key).await
    }
}
