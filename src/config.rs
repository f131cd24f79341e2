//! Command-line arguments and service configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Granularity used to size cloud volumes in block counts.
pub const VOLUME_BLOCK_SIZE: usize = 1024;

/// Default port for the network volume server.
pub const DEFAULT_NET_PORT: u16 = 8888;

/// Rolling per-frame read deadline on network connections.
pub const READ_DEADLINE: Duration = Duration::from_secs(10);

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "blobvol")]
#[command(about = "Remotely-backed block volumes over cloud, file, and network backends")]
#[command(version)]
pub struct Args {
    /// Create a cloud page-blob volume sized BLOCKS * 1024 bytes, then exit.
    #[arg(
        short = 'c',
        long = "create",
        num_args = 5,
        value_names = ["NAME", "CONTAINER", "ACCOUNT", "KEY", "BLOCKS"]
    )]
    pub create: Option<Vec<String>>,

    /// Local file to serve as a network volume.
    pub file: Option<PathBuf>,

    /// Port for the network volume server.
    #[arg(long, default_value_t = DEFAULT_NET_PORT)]
    pub port: u16,

    /// Enable debug logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Enable silent mode (minimal logging).
    #[arg(long, short = 's')]
    pub silent: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            create: None,
            file: None,
            port: DEFAULT_NET_PORT,
            debug: false,
            silent: false,
        }
    }
}

/// What the process was asked to do.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Create a cloud volume and exit.
    Create {
        name: String,
        container: String,
        account: String,
        key: String,
        blocks: u64,
    },
    /// Serve a local file as a network volume until interrupted.
    Serve { file: PathBuf },
}

/// Service configuration derived from command-line arguments.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Port for the network volume server.
    pub port: u16,
    /// Enable debug logging.
    pub debug: bool,
}

impl Config {
    /// Validates the parsed arguments into a runnable configuration.
    pub fn from_args(args: Args) -> Result<Self, String> {
        let mode = match (args.create, args.file) {
            (Some(values), _) => {
                let [name, container, account, key, blocks] =
                    <[String; 5]>::try_from(values).map_err(|_| "not enough arguments")?;
                let blocks: u64 = blocks
                    .parse()
                    .map_err(|_| format!("invalid block count: {blocks}"))?;
                Mode::Create {
                    name,
                    container,
                    account,
                    key,
                    blocks,
                }
            }
            (None, Some(file)) => Mode::Serve { file },
            (None, None) => return Err("not enough arguments".to_string()),
        };

        Ok(Self {
            mode,
            port: args.port,
            debug: args.debug,
        })
    }
}
