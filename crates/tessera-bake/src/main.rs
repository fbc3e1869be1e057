use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tessera_bake::{bake_grid, BakeParams};
use tessera_core::constants::{AVAILABLE_RADIUS, CHUNK_ASSET_DIR, CHUNK_SIZE};

/// Generate the chunk asset set: one GLB per grid coordinate.
#[derive(Parser, Debug)]
#[command(name = "bake-chunks", version)]
struct Args {
    /// Output directory for `{x}_{z}.glb` files
    #[arg(short, long, default_value = CHUNK_ASSET_DIR)]
    out: PathBuf,

    /// Bake every chunk with both coordinates in [-radius, radius]
    #[arg(short, long, default_value_t = AVAILABLE_RADIUS as u32)]
    radius: u32,

    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: f32,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = BakeParams {
        seed: args.seed,
        ..BakeParams::for_chunk_size(args.chunk_size)
    };

    match bake_grid(&args.out, args.radius, &params) {
        Ok(summary) => {
            log::info!(
                "Baked {} chunks into {} ({} triangles, {:.1} KiB)",
                summary.chunks,
                args.out.display(),
                summary.triangles,
                summary.bytes as f64 / 1024.0
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
