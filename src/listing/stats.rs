use std::time::Duration;

use chrono::{DateTime, Utc};

/// Summary of one listing, delivered when its producer finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub objects_seen: u64,
    pub objects_sent: u64,
    pub objects_skipped: u64,
    pub bytes_sent: u64,
    pub cancelled: bool,
    pub failed: bool,
}

impl ListingStats {
    pub fn new() -> Self {
        ListingStats {
            start_time: Utc::now(),
            end_time: None,
            objects_seen: 0,
            objects_sent: 0,
            objects_skipped: 0,
            bytes_sent: 0,
            cancelled: false,
            failed: false,
        }
    }

    pub fn end(&mut self) -> Duration {
        let end_time = Utc::now();
        self.end_time = Some(end_time);
        self.elapsed_time()
    }

    pub fn elapsed_time(&self) -> Duration {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        (end_time - self.start_time).to_std().unwrap_or_default()
    }
}

impl Default for ListingStats {
    fn default() -> Self {
        ListingStats::new()
    }
}
