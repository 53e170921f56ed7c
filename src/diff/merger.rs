use std::cmp::Ordering;
use std::io::Write;
use tracing::{debug, info};

use crate::diff::{DiffStats, LineSource, StreamItem};
use crate::error::Result;

/// Consumer side of a diff run: walks two sorted streams in lock-step and
/// classifies every key as unchanged, updated, added or deleted.
pub struct DiffMerger<N: Write, D: Write> {
    new_or_updated: N,
    deleted: D,
    stats: DiffStats,
}

impl<N: Write, D: Write> DiffMerger<N, D> {
    pub fn new(new_or_updated: N, deleted: D) -> Self {
        Self {
            new_or_updated,
            deleted,
            stats: DiffStats::default(),
        }
    }

    /// Runs the merge until both sources have produced their sentinel.
    ///
    /// Both sources must be sorted by key with no duplicates; this is not
    /// checked here and unsorted input yields a wrong diff rather than an error.
    pub fn merge<P, L>(mut self, previous: &mut P, latest: &mut L) -> Result<DiffStats>
    where
        P: LineSource,
        L: LineSource,
    {
        let mut p = previous.next_item();
        let mut n = latest.next_item();

        loop {
            match (p, n) {
                (StreamItem::EndOfStream, StreamItem::EndOfStream) => {
                    debug!("both streams exhausted");
                    break;
                }
                (StreamItem::EndOfStream, StreamItem::Record(next)) => {
                    self.write_new(next.key(), false)?;
                    p = StreamItem::EndOfStream;
                    n = latest.next_item();
                }
                (StreamItem::Record(prev), StreamItem::EndOfStream) => {
                    self.write_deleted(prev.key())?;
                    p = previous.next_item();
                    n = StreamItem::EndOfStream;
                }
                (StreamItem::Record(prev), StreamItem::Record(next)) => {
                    match prev.compare_key(&next) {
                        Ordering::Equal => {
                            if prev == next {
                                self.stats.unchanged += 1;
                            } else {
                                self.write_new(next.key(), true)?;
                            }
                            p = previous.next_item();
                            n = latest.next_item();
                        }
                        Ordering::Greater => {
                            self.write_new(next.key(), false)?;
                            p = StreamItem::Record(prev);
                            n = latest.next_item();
                        }
                        Ordering::Less => {
                            self.write_deleted(prev.key())?;
                            p = previous.next_item();
                            n = StreamItem::Record(next);
                        }
                    }
                }
            }
        }

        self.new_or_updated.flush()?;
        self.deleted.flush()?;

        info!(
            "diff complete: {} added, {} updated, {} deleted, {} unchanged",
            self.stats.added, self.stats.updated, self.stats.deleted, self.stats.unchanged
        );

        Ok(self.stats)
    }

    fn write_new(&mut self, key: &str, updated: bool) -> Result<()> {
        writeln!(self.new_or_updated, "{}", key)?;
        if updated {
            self.stats.updated += 1;
        } else {
            self.stats.added += 1;
        }
        Ok(())
    }

    fn write_deleted(&mut self, key: &str) -> Result<()> {
        writeln!(self.deleted, "{}", key)?;
        self.stats.deleted += 1;
        Ok(())
    }
}
