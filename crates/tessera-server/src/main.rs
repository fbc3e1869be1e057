use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tessera_core::constants::{CHUNK_ASSET_DIR, SERVER_PORT};
use tessera_server::{ServerConfig, SiteDirs};

/// Static file server for the Tessera viewer page and chunk assets.
#[derive(Parser, Debug)]
#[command(name = "tessera-server", version)]
struct Args {
    /// Site root holding index.html and the wasm package
    #[arg(long, default_value = "web")]
    root: PathBuf,

    /// Directory served under /chunks
    #[arg(long, default_value = CHUNK_ASSET_DIR)]
    chunks: PathBuf,

    #[arg(long, default_value_t = SERVER_PORT)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        dirs: SiteDirs::new(args.root, args.chunks),
        host: args.host,
        port: args.port,
    };

    match tessera_server::serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
