use std::{ops::RangeInclusive, path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args};
use concolor_clap::ColorChoice;
use humantime::parse_duration;

use crate::backend::StorageUrl;

use super::parse::{parse_range_inclusive, parse_time};

const BUFFER_SIZE_RANGE: RangeInclusive<usize> = 1..=1 << 20;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn parse_buffer_size(s: &str) -> Result<usize, String> {
    parse_range_inclusive(s, BUFFER_SIZE_RANGE)
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Bucket to list
    pub bucket: String,

    /// Only list keys starting with this prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Only list objects created after this time (RFC 3339, or a duration ago like '20d')
    #[arg(short = 's', long, value_name = "TIME", value_parser = parse_time)]
    pub since: Option<DateTime<Utc>>,

    /// Only list objects created before this time (RFC 3339, or a duration ago like '1h')
    #[arg(short = 'u', long, value_name = "TIME", value_parser = parse_time)]
    pub until: Option<DateTime<Utc>>,

    /// Number of records buffered ahead of output
    #[arg(short = 'b', long, value_name = "NUM", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Print one JSON object per line
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Stop listing after this long
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Bucket to read from
    pub bucket: String,

    /// Object key
    pub key: String,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Bucket to write to
    pub bucket: String,

    /// Object key
    pub key: String,

    /// File to upload
    pub file: PathBuf,

    /// Content type stored with the object
    #[arg(short = 'T', long, value_name = "MIME", default_value = DEFAULT_CONTENT_TYPE)]
    pub content_type: String,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Bucket to delete from
    pub bucket: String,

    /// Object key(s)
    #[arg(required = true)]
    pub keys: Vec<String>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Storage backend (e.g. 's3://', 'file://<path>' or 'memory://')
    #[arg(short = 'S', long, value_name = "URL")]
    pub storage: Option<StorageUrl>,

    /// Add latency when using local storage
    #[arg(short = 'L', long, value_parser = parse_duration)]
    pub latency: Option<Duration>,

    /// Fetch content type and encoding for every listed S3 object
    #[arg(long, default_value_t = false)]
    pub fetch_headers: bool,

    /// Print stats after completion
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[command(flatten)]
    pub logger: LoggerArgs,
}

#[derive(Args, Debug)]
pub struct LoggerArgs {
    /// When to use color in output
    #[arg(short, long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print more output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub verbose: u8,

    /// Print less output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub quiet: u8,
}
