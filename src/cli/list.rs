use std::{
    io::{self, Write},
    time::Duration,
};

use humantime::format_duration;
use log::{debug, warn};
use tokio::{select, signal, spawn, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::Result,
    format::{format_size, format_time},
    listing::{ListingStats, ObjectStream},
    record::ObjectRecord,
    StorageFacade,
};

use super::{print_stat, ListArgs};

pub async fn main(args: ListArgs, config: Config) -> Result<()> {
    let facade = StorageFacade::new(config).await;
    let cancel = CancellationToken::new();
    spawn(cancel_on_interrupt(cancel.clone(), args.timeout));

    let buffer_size = args.buffer_size.unwrap_or(facade.config().buffer_size);
    let stream = if args.since.is_some() || args.until.is_some() {
        facade.list_bucket_by_time(
            &args.bucket,
            &args.prefix,
            args.since,
            args.until,
            buffer_size,
            cancel.clone(),
        )?
    } else {
        facade.list_bucket(&args.bucket, &args.prefix, buffer_size, cancel.clone())?
    };

    let result = print_records(&stream, args.json).await;
    let stats = close_listing(stream, &cancel, result.is_err()).await?;
    if stats.cancelled && result.is_ok() {
        warn!("listing was cancelled");
    }

    if args.global.stats {
        print_stat("objects listed", stats.objects_sent);
        print_stat("objects skipped", stats.objects_skipped);
        print_stat("total size", format_size(stats.bytes_sent));
        print_stat("elapsed time", format_duration(stats.elapsed_time()));
    }

    cancel.cancel();
    result
}

/// Stops at the first failure; the caller drains whatever is left.
async fn print_records(stream: &ObjectStream, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    while let Some(item) = stream.recv().await {
        let record = item?;
        if json {
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_record(&record))?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Drains the listing and waits for its producer. After an early exit the
/// producer is cancelled first so it stops paging the bucket.
async fn close_listing(
    stream: ObjectStream,
    cancel: &CancellationToken,
    stopped_early: bool,
) -> Result<ListingStats> {
    if stopped_early {
        cancel.cancel();
    }

    stream.drain().await
}

fn format_record(record: &ObjectRecord) -> String {
    let time = format_time(&record.created_at());
    let size = format_size(record.size());
    let name = record.name();
    format!("{time} {size:>10} {name}")
}

async fn cancel_on_interrupt(cancel: CancellationToken, timeout: Option<Duration>) {
    let deadline = async {
        match timeout {
            Some(timeout) => sleep(timeout).await,
            None => std::future::pending().await,
        }
    };

    select! {
        () = cancel.cancelled() => return,
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                warn!("unable to listen for interrupts: {err}");
                return;
            }
            debug!("interrupted");
        }
        () = deadline => debug!("timed out"),
    }

    cancel.cancel();
}
