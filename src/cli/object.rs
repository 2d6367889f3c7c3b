use clap::builder::styling::AnsiColor;
use log::info;
use tokio::{fs, io::AsyncWriteExt};

use crate::{config::Config, error::Result, format::format_size, StorageFacade};

use super::{print_stat, GetArgs, PutArgs, RemoveArgs};

pub async fn get(args: GetArgs, config: Config) -> Result<()> {
    let facade = StorageFacade::new(config).await;
    let data = facade.get_object(&args.bucket, &args.key).await?;
    let size = data.len();

    if let Some(path) = &args.output {
        fs::write(path, &data).await?;
    } else {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;
    }

    if args.global.stats {
        print_stat("downloaded", format_size(size));
    }

    Ok(())
}

pub async fn put(args: PutArgs, config: Config) -> Result<()> {
    let facade = StorageFacade::new(config).await;
    let data = fs::read(&args.file).await?;
    let size = data.len();

    facade
        .put_object(&args.bucket, &args.content_type, &args.key, data)
        .await?;

    let style = AnsiColor::Green.on_default();
    info!("{style}uploaded{style:#} {}/{}", args.bucket, args.key);

    if args.global.stats {
        print_stat("uploaded", format_size(size));
    }

    Ok(())
}

pub async fn remove(args: RemoveArgs, config: Config) -> Result<()> {
    let facade = StorageFacade::new(config).await;

    for key in &args.keys {
        facade.delete_object(&args.bucket, key).await?;
        let style = AnsiColor::Yellow.on_default();
        info!("{style}deleted{style:#} {}/{key}", args.bucket);
    }

    if args.global.stats {
        print_stat("objects deleted", args.keys.len());
    }

    Ok(())
}
