use async_channel::Receiver;
use async_stream::stream;
use log::{trace, warn};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::{error::Result, record::ObjectRecord};

use super::{ListingStats, StreamItem};

/// Consumer end of one listing.
///
/// There is no way to close the channel from here: the producer closes it
/// when it finishes. Dropping the handle disconnects the channel, which the
/// producer treats like cancellation on its next send.
#[derive(Debug)]
pub struct ObjectStream {
    receiver: Receiver<StreamItem>,
    producer: JoinHandle<ListingStats>,
}

impl ObjectStream {
    pub(crate) fn new(receiver: Receiver<StreamItem>, producer: JoinHandle<ListingStats>) -> Self {
        ObjectStream { receiver, producer }
    }

    /// Next item, or `None` once the producer has closed the channel and
    /// every buffered item has been received.
    pub async fn recv(&self) -> Option<StreamItem> {
        self.receiver.recv().await.ok()
    }

    pub fn capacity(&self) -> usize {
        self.receiver.capacity().unwrap_or_default()
    }

    /// Items currently buffered.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Waits for the producer's completion notification.
    ///
    /// Only returns after the channel is closed, so call this after reading
    /// to the end or use [`ObjectStream::drain`].
    pub async fn finish(self) -> Result<ListingStats> {
        let stats = self.producer.await?;
        Ok(stats)
    }

    /// Discards everything still in flight, then waits for the producer.
    pub async fn drain(self) -> Result<ListingStats> {
        drain(&self).await;
        self.finish().await
    }

    /// Collects every record, or returns the listing's error item.
    ///
    /// On error the rest of the channel is drained before returning, and
    /// the error item is returned even if the producer task failed.
    pub async fn try_collect(self) -> Result<Vec<ObjectRecord>> {
        let mut records = vec![];
        while let Some(item) = self.recv().await {
            match item {
                Ok(record) => records.push(record),
                Err(err) => {
                    if let Err(drain_err) = self.drain().await {
                        warn!("listing producer did not finish cleanly: {drain_err}");
                    }
                    return Err(err);
                }
            }
        }

        self.finish().await?;
        Ok(records)
    }

    pub fn into_stream(self) -> impl Stream<Item = StreamItem> + Send + 'static {
        stream! {
            while let Some(item) = self.recv().await {
                yield item;
            }
        }
    }
}

/// Receives and discards items until the producer closes the channel.
pub async fn drain(stream: &ObjectStream) {
    let mut drained = 0_usize;
    while stream.recv().await.is_some() {
        drained += 1;
    }

    trace!("drained {drained} items from listing channel");
}
