//! Streaming bucket listing.
//!
//! Each listing call spawns exactly one producer task that drives a backend
//! [`ObjectIterator`](crate::backend::ObjectIterator) and writes into a
//! bounded channel. The producer is the only party that closes the channel;
//! consumers either read it to the end or [`drain`] it.

mod producer;
mod stats;
mod stream;


use chrono::{DateTime, Utc};

use crate::{
    error::{Error, Result},
    record::ObjectRecord,
};

pub(crate) use producer::spawn_producer;

pub use self::{
    stats::ListingStats,
    stream::{drain, ObjectStream},
};

/// One item on a listing channel. At most one `Err` appears, and only as the last item.
pub type StreamItem = Result<ObjectRecord>;

/// Open creation-time interval: both bounds are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    /// Fails with [`Error::MissingDateRange`] unless both bounds are present.
    pub fn from_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Ok(TimeWindow::new(start, end)),
            _ => Err(Error::MissingDateRange),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start < time && time < self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingRequest {
    bucket: String,
    prefix: Option<String>,
    window: Option<TimeWindow>,
    buffer_size: usize,
}

impl ListingRequest {
    /// An empty `prefix` means no prefix filter.
    pub fn new(bucket: &str, prefix: &str, buffer_size: usize) -> Result<Self> {
        if bucket.is_empty() {
            return Err(Error::EmptyBucketName);
        }

        if buffer_size == 0 {
            return Err(Error::InvalidBufferSize(buffer_size));
        }

        let prefix = (!prefix.is_empty()).then(|| prefix.to_owned());
        Ok(ListingRequest {
            bucket: bucket.to_owned(),
            prefix,
            window: None,
            buffer_size,
        })
    }

    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn window(&self) -> Option<&TimeWindow> {
        self.window.as_ref()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn accepts(&self, record: &ObjectRecord) -> bool {
        self.window
            .map_or(true, |window| window.contains(record.created_at()))
    }
}
