use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, debug, error, info};

use samdemux::cli;
use samdemux::config::defs::RunConfig;
use samdemux::pipelines::demux;

fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = cli::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n SamDemux\n-------------\n");

    let cwd = env::current_dir()?;
    debug!("The current directory is {:?}", cwd);

    let out_dir = resolve_out_dir(&args.output, &cwd);
    info!("Writing per-sample FASTQ files to {:?}", out_dir);

    let config = RunConfig { cwd, out_dir, args };

    if let Err(e) = demux::run(&config) {
        error!(
            "Demultiplexing failed: {} at {} milliseconds.",
            e,
            run_start.elapsed().as_millis()
        );
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

/// Resolves the output directory against the current working directory.
fn resolve_out_dir(output: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(output);
    if path.is_absolute() { path } else { cwd.join(path) }
}
