use crate::stats::{Aggregate, ChunkAggregate, MergedResult};

/// Folds chunk aggregates into one result.
///
/// Counts for the same `(url, date)` pair are summed, so fold order never
/// changes the totals. URLs keep the order in which they were first folded.
#[derive(Debug, Default)]
pub struct Merger {
    urls: Aggregate,
    chunks: usize,
    lines_read: u64,
    lines_skipped: u64,
}

impl Merger {
    pub fn fold(&mut self, chunk: ChunkAggregate) {
        self.chunks += 1;
        self.lines_read += chunk.lines_read;
        self.lines_skipped += chunk.lines_skipped;

        for (url, dates) in chunk.counts {
            let merged = self.urls.entry(url).or_default();
            for (date, count) in dates {
                *merged.entry(date).or_insert(0) += count;
            }
        }
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }

    /// Sorts each URL's dates ascending and hands over the result.
    pub fn finish(mut self) -> MergedResult {
        for dates in self.urls.values_mut() {
            dates.sort_keys();
        }
        MergedResult { urls: self.urls }
    }
}

pub fn merge<I>(chunks: I) -> MergedResult
where
    I: IntoIterator<Item = ChunkAggregate>,
{
    let mut merger = Merger::default();
    for chunk in chunks {
        merger.fold(chunk);
    }
    merger.finish()
}
