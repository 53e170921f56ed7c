use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use snapshot_diff::{
    compare_snapshots, sort_snapshot, verify_sorted, DiffConfig, DiffOutputs, ExternalSortConfig,
    SnapshotConfig, SnapshotError,
};

const HEADER: &str = "accession\tlast_updated";

/// Helper to write a snapshot file with the standard header
fn write_snapshot(dir: &Path, name: &str, rows: &[&str]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut content = format!("{}\n", HEADER);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content)?;
    Ok(path)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_string)
        .collect())
}

fn sort_config(temp_dir: &TempDir) -> ExternalSortConfig {
    ExternalSortConfig {
        temp_directory: temp_dir.path().join("scratch"),
        processing_threads: 2,
        ..ExternalSortConfig::default()
    }
}

/// Sorts both snapshots, diffs them and returns (new_or_updated, deleted).
async fn sort_and_diff(previous: &[&str], latest: &[&str]) -> Result<(Vec<String>, Vec<String>)> {
    let temp_dir = TempDir::new()?;
    let prev_raw = write_snapshot(temp_dir.path(), "prev_raw.tsv", previous)?;
    let next_raw = write_snapshot(temp_dir.path(), "next_raw.tsv", latest)?;

    let prev_sorted = temp_dir.path().join("prev.tsv");
    let next_sorted = temp_dir.path().join("next.tsv");
    sort_snapshot(&prev_raw, &prev_sorted, sort_config(&temp_dir)).await?;
    sort_snapshot(&next_raw, &next_sorted, sort_config(&temp_dir)).await?;

    let outputs = DiffOutputs::in_directory(temp_dir.path(), "test");
    compare_snapshots(&prev_sorted, &next_sorted, &outputs, DiffConfig::default()).await?;

    Ok((read_lines(&outputs.new_or_updated)?, read_lines(&outputs.deleted)?))
}

#[tokio::test]
async fn test_added_and_removed_keys() -> Result<()> {
    let (new, deleted) = sort_and_diff(
        &["B\t2020-01-01", "A\t2020-01-01"],
        &["C\t2020-01-01", "B\t2020-01-01"],
    )
    .await?;

    assert_eq!(new, vec!["C"]);
    assert_eq!(deleted, vec!["A"]);
    Ok(())
}

#[tokio::test]
async fn test_changed_date_is_new_or_updated() -> Result<()> {
    let (new, deleted) = sort_and_diff(&["A\t2020-01-01"], &["A\t2021-01-01"]).await?;

    assert_eq!(new, vec!["A"]);
    assert!(deleted.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_previous_snapshot() -> Result<()> {
    let (new, deleted) = sort_and_diff(&[], &["B\t2020-01-01", "A\t2020-01-01"]).await?;

    assert_eq!(new, vec!["A", "B"]);
    assert!(deleted.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_latest_snapshot() -> Result<()> {
    let (new, deleted) = sort_and_diff(&["A\t2020-01-01", "B\t2020-01-01"], &[]).await?;

    assert!(new.is_empty());
    assert_eq!(deleted, vec!["A", "B"]);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_against_itself_is_empty() -> Result<()> {
    let rows = ["KAAA01000000\t2019-05-10", "TAAT01000000\t2023-12-27", "BAAA01000000\t2018-01-01"];
    let (new, deleted) = sort_and_diff(&rows, &rows).await?;

    assert!(new.is_empty());
    assert!(deleted.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sorted_snapshot_keeps_header_first() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let raw = write_snapshot(
        temp_dir.path(),
        "raw.tsv",
        &["TAAT01000000\t2023-12-27", "KAAA01000000\t2019-05-10"],
    )?;
    let sorted = temp_dir.path().join("sorted.tsv");
    sort_snapshot(&raw, &sorted, sort_config(&temp_dir)).await?;

    let lines = read_lines(&sorted)?;
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines[1], "KAAA01000000\t2019-05-10");
    assert_eq!(lines[lines.len() - 1], "TAAT01000000\t2023-12-27");
    Ok(())
}

#[tokio::test]
async fn test_corrupt_latest_snapshot_fails_the_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let previous = write_snapshot(temp_dir.path(), "prev.tsv", &["A\t2020-01-01"])?;
    let latest = write_snapshot(temp_dir.path(), "next.tsv", &["A\t2020-01-01", "B"])?;

    let outputs = DiffOutputs::in_directory(temp_dir.path(), "corrupt");
    let result = compare_snapshots(&previous, &latest, &outputs, DiffConfig::default()).await;

    assert!(matches!(result, Err(SnapshotError::SnapshotLoad { .. })));
    assert!(!outputs.new_or_updated.exists());
    assert!(!outputs.deleted.exists());
    Ok(())
}

#[tokio::test]
async fn test_sorted_output_passes_check_with_default_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let raw = write_snapshot(
        temp_dir.path(),
        "raw.tsv",
        &["KAAA01000000\t2019-05-10", "BAAA01000000\t2018-01-01"],
    )?;
    let sorted = temp_dir.path().join("sorted.tsv");

    let mut config = SnapshotConfig::default();
    config.sort.temp_directory = temp_dir.path().join("scratch");
    sort_snapshot(&raw, &sorted, config.sort.clone()).await?;

    assert_eq!(verify_sorted(&sorted, &config.sort_check_config())?, 2);
    Ok(())
}

#[tokio::test]
async fn test_headerless_snapshots_with_default_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let previous = temp_dir.path().join("prev.tsv");
    let raw = temp_dir.path().join("next_raw.tsv");
    fs::write(&previous, "A\t2020-01-01\nZ\t2020-01-01\n")?;
    fs::write(&raw, "Z\t2020-01-01\nA\t2020-01-01\n")?;

    let latest = temp_dir.path().join("next.tsv");
    sort_snapshot(&raw, &latest, sort_config(&temp_dir)).await?;
    assert_eq!(read_lines(&latest)?, vec!["A\t2020-01-01", "Z\t2020-01-01"]);

    let outputs = DiffOutputs::in_directory(temp_dir.path(), "headerless");
    let stats = compare_snapshots(&previous, &latest, &outputs, DiffConfig::default()).await?;

    assert_eq!(stats.unchanged, 2);
    assert!(read_lines(&outputs.new_or_updated)?.is_empty());
    assert!(read_lines(&outputs.deleted)?.is_empty());
    Ok(())
}
