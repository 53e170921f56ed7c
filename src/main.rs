use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use snapshot_diff::constants::{BYTES_PER_MB, SNAPSHOT_EXTENSION};
use snapshot_diff::utils::{self, format_bytes, format_duration};
use snapshot_diff::{
    compare_snapshots, sort_snapshot, verify_sorted, DiffOutputs, DiffStats, SnapshotConfig,
};

#[derive(Parser)]
#[command(name = "snapshot-diff")]
#[command(about = "Sort accession snapshots and list what changed between two of them")]
#[command(version)]
struct Args {
    #[arg(short, long, global = true, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sort an unsorted snapshot by accession using a disk-backed merge sort
    Sort {
        #[arg(short, long, help = "Unsorted snapshot file")]
        input: PathBuf,

        #[arg(short, long, help = "Destination for the sorted snapshot")]
        output: PathBuf,
    },

    /// Compare two sorted snapshots
    Diff {
        #[arg(short, long, help = "Previous sorted snapshot")]
        previous: PathBuf,

        #[arg(short, long, help = "Latest sorted snapshot")]
        latest: PathBuf,

        #[arg(short, long, help = "Directory for the diff lists")]
        output_dir: PathBuf,

        #[arg(long, help = "Name prefix for the diff lists")]
        prefix: String,

        #[arg(long, help = "Verify both inputs are sorted before comparing")]
        check_sorted: bool,
    },

    /// Sort a freshly fetched snapshot, then compare it with the previous one
    Run {
        #[arg(short, long, help = "Previous sorted snapshot (treated as empty if missing)")]
        previous: PathBuf,

        #[arg(short, long, help = "Unsorted latest snapshot")]
        unsorted_latest: PathBuf,

        #[arg(short, long, help = "Directory for the sorted snapshot and diff lists")]
        output_dir: PathBuf,

        #[arg(long, help = "Name prefix for generated files")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SnapshotConfig::load_or_default(args.config.as_ref()).await?;

    let verbosity = if args.verbose { "verbose" } else { config.logging.verbosity.as_str() };
    utils::setup_logging(verbosity)?;

    let start_time = Instant::now();

    match args.command {
        Command::Sort { input, output } => {
            ensure_exists(&input)?;
            let stats = sort_snapshot(&input, &output, config.sort.clone()).await?;
            info!(
                "sorted {} records in {} chunks ({} spilled)",
                stats.records_written,
                stats.chunks_created,
                format_bytes((stats.disk_usage_mb * BYTES_PER_MB as f64) as u64)
            );
        }
        Command::Diff {
            previous,
            latest,
            output_dir,
            prefix,
            check_sorted,
        } => {
            ensure_exists(&previous)?;
            ensure_exists(&latest)?;
            std::fs::create_dir_all(&output_dir)?;

            if check_sorted {
                let check = config.sort_check_config();
                for path in [&previous, &latest] {
                    let records = verify_sorted(path, &check)
                        .with_context(|| format!("{} failed the sort check", path.display()))?;
                    info!("{} is sorted ({} records)", path.display(), records);
                }
            }

            let outputs = DiffOutputs::in_directory(&output_dir, &prefix);
            let stats = compare_snapshots(&previous, &latest, &outputs, config.diff.clone()).await?;
            report(&stats, &outputs);
        }
        Command::Run {
            previous,
            unsorted_latest,
            output_dir,
            prefix,
        } => {
            ensure_exists(&unsorted_latest)?;
            std::fs::create_dir_all(&output_dir)?;

            let previous = if previous.exists() {
                previous
            } else {
                info!(
                    "previous snapshot {} does not exist, comparing against an empty one",
                    previous.display()
                );
                let empty = output_dir.join(format!("{}_empty-previous{}", prefix, SNAPSHOT_EXTENSION));
                std::fs::write(&empty, "")?;
                empty
            };

            let latest = output_dir.join(format!("{}{}", prefix, SNAPSHOT_EXTENSION));
            ensure_distinct(&previous, &latest)?;
            sort_snapshot(&unsorted_latest, &latest, config.sort.clone()).await?;
            info!("latest snapshot written to {}", latest.display());

            let outputs = DiffOutputs::in_directory(&output_dir, &prefix);
            let stats = compare_snapshots(&previous, &latest, &outputs, config.diff.clone()).await?;
            report(&stats, &outputs);
        }
    }

    info!("finished in {}", format_duration(start_time.elapsed().as_secs_f64()));

    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    Ok(())
}

/// The sorted latest snapshot is written before the diff reads `previous`,
/// so the two must not be the same file.
fn ensure_distinct(previous: &Path, latest: &Path) -> Result<()> {
    let same = match (previous.canonicalize(), latest.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => previous == latest,
    };
    if same {
        anyhow::bail!(
            "previous snapshot {} would be overwritten by the sorted latest snapshot; \
             choose another --prefix or --output-dir",
            previous.display()
        );
    }
    Ok(())
}

fn report(stats: &DiffStats, outputs: &DiffOutputs) {
    info!("Added: {}", stats.added);
    info!("Updated: {}", stats.updated);
    info!("Deleted: {}", stats.deleted);
    info!("Unchanged: {}", stats.unchanged);
    info!("New or updated list: {}", outputs.new_or_updated.display());
    info!("Deleted list: {}", outputs.deleted.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_rejects_previous_at_latest_path() {
        let dir = tempdir().unwrap();
        let latest = dir.path().join("snap.tsv");
        std::fs::write(&latest, "A\t2020-01-01\n").unwrap();

        let same_via_dot = dir.path().join(".").join("snap.tsv");
        assert!(ensure_distinct(&latest, &latest).is_err());
        assert!(ensure_distinct(&same_via_dot, &latest).is_err());

        let other = dir.path().join("other.tsv");
        std::fs::write(&other, "").unwrap();
        assert!(ensure_distinct(&other, &latest).is_ok());
        assert!(ensure_distinct(&other, &dir.path().join("not-yet.tsv")).is_ok());
    }
}
