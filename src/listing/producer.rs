use async_channel::Sender;
use log::{debug, warn};
use tokio::{select, spawn};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{backend::SharedBackend, error::Error, record::ObjectRecord};

use super::{ListingRequest, ListingStats, ObjectStream, StreamItem};

#[derive(Debug, PartialEq, Eq)]
enum SendOutcome {
    Delivered,
    Cancelled,
    Disconnected,
}

struct Producer {
    backend: SharedBackend,
    request: ListingRequest,
    cancel: CancellationToken,
    sender: Sender<StreamItem>,
}

/// Starts the single producer task for `request` and returns the consumer's end.
pub(crate) fn spawn_producer(
    backend: SharedBackend,
    request: ListingRequest,
    cancel: CancellationToken,
) -> ObjectStream {
    let (sender, receiver) = async_channel::bounded(request.buffer_size());
    let producer = Producer {
        backend,
        request,
        cancel,
        sender,
    };

    let handle = spawn(producer.run());
    ObjectStream::new(receiver, handle)
}

impl Producer {
    async fn run(self) -> ListingStats {
        let mut stats = ListingStats::new();
        let bucket = self.request.bucket();
        debug!("listing `{bucket}` has started");

        let mut objects = self
            .backend
            .open_iterator(bucket, self.request.prefix());

        loop {
            if self.cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let metadata = match objects.next().await {
                Some(Ok(metadata)) => metadata,
                Some(Err(err)) => {
                    warn!("listing `{bucket}` failed: {err}");
                    stats.failed = true;
                    let item = Err(Error::backend_iteration(bucket, err));
                    if self.send(item).await == SendOutcome::Cancelled {
                        stats.cancelled = true;
                    }
                    break;
                }
                None => break,
            };

            stats.objects_seen += 1;
            let record = ObjectRecord::from(metadata);
            if !self.request.accepts(&record) {
                stats.objects_skipped += 1;
                continue;
            }

            let size = record.size();
            match self.send(Ok(record)).await {
                SendOutcome::Delivered => {
                    stats.objects_sent += 1;
                    stats.bytes_sent += size;
                }
                SendOutcome::Cancelled => {
                    stats.cancelled = true;
                    break;
                }
                SendOutcome::Disconnected => {
                    debug!("listing `{bucket}` was abandoned by its consumer");
                    break;
                }
            }
        }

        drop(objects);
        self.sender.close();
        stats.end();

        debug!(
            "listing `{bucket}` has finished: {} sent, {} skipped{}",
            stats.objects_sent,
            stats.objects_skipped,
            if stats.cancelled { ", cancelled" } else { "" },
        );
        stats
    }

    /// Waits for channel capacity unless cancellation fires first, in which
    /// case `item` is dropped unsent.
    async fn send(&self, item: StreamItem) -> SendOutcome {
        select! {
            biased;
            () = self.cancel.cancelled() => SendOutcome::Cancelled,
            result = self.sender.send(item) => match result {
                Ok(()) => SendOutcome::Delivered,
                Err(_) => SendOutcome::Disconnected,
            },
        }
    }
}
