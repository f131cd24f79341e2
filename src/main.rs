//! Blobvol: remotely-backed block volume service.
//!
//! `-c NAME CONTAINER ACCOUNT KEY BLOCKS` creates a cloud page-blob
//! volume and exits; otherwise a local file is served as a network
//! volume until interrupted.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use blobvol::{Args, BlobVolume, Config, Mode, NetFileVolume, Volume};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = if args.debug {
        Level::DEBUG
    } else if args.silent {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(message) => die(&message),
    };

    match config.mode {
        Mode::Create {
            name,
            container,
            account,
            key,
            blocks,
        } => match BlobVolume::create(&name, blocks, &container, &account, &key).await {
            Ok(volume) => {
                println!("created page blob volume {} ({} bytes)", name, volume.size());
            }
            Err(err) => die(&format!("Failure creating page blob: {err}")),
        },
        Mode::Serve { file } => {
            let shutdown = CancellationToken::new();
            let volume = match NetFileVolume::open(&file, config.port, shutdown.clone()).await {
                Ok(volume) => volume,
                Err(err) => die(&format!("Failure opening volume: {err}")),
            };

            info!(
                "serving {} ({} bytes) on {}",
                file.display(),
                volume.size(),
                volume.local_addr()
            );

            if let Err(err) = tokio::signal::ctrl_c().await {
                die(&format!("Failure waiting for interrupt: {err}"));
            }
            println!("\nReceived an interrupt, stopping services...");
            shutdown.cancel();

            if let Err(err) = volume.shutdown().await {
                warn!("shutdown incomplete: {}", err);
            }
        }
    }
}

fn die(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
