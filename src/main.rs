use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    bucketstream::cli::main().await
}
