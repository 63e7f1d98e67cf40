//! ring_inspect - offline checker for the persistence ring
//!
//! Walks a ring directory, validates each slot's PGM header, and prints
//! per-slot brightness statistics so saved night frames can be verified
//! without pulling them off the device one by one.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use nightsight::{read_pgm, PlaneStats, DEFAULT_RING_SLOTS};

#[derive(Parser, Debug)]
#[command(name = "ring_inspect", about = "Validate and summarize persisted ring frames")]
struct Args {
    /// Ring directory to inspect.
    #[arg(long, env = "NIGHTSIGHT_RING_DIR", default_value = "frames")]
    dir: PathBuf,

    /// Number of ring slots to probe.
    #[arg(long, default_value_t = DEFAULT_RING_SLOTS)]
    slots: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.dir.is_dir() {
        return Err(anyhow!("{} is not a directory", args.dir.display()));
    }

    let mut present = 0usize;
    let mut invalid = 0usize;

    for slot in 0..args.slots {
        let path = args.dir.join(format!("night_{}.pgm", slot));
        if !path.exists() {
            continue;
        }
        present += 1;

        match read_pgm(&path) {
            Ok(plane) => {
                let stats = PlaneStats::compute(&plane);
                println!(
                    "slot {:>3}: {}x{} min={:>3} max={:>3} mean={:>3}",
                    slot, plane.width, plane.height, stats.min, stats.max, stats.mean
                );
            }
            Err(e) => {
                invalid += 1;
                println!("slot {:>3}: INVALID ({})", slot, e);
            }
        }
    }

    println!(
        "{} of {} slots occupied, {} invalid",
        present, args.slots, invalid
    );
    if invalid > 0 {
        return Err(anyhow!("{} invalid slot files", invalid));
    }
    Ok(())
}
