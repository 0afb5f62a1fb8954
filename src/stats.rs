use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::time::Duration;

/// Date -> hit count for one URL.
pub type DateCounts = IndexMap<String, u64>;

/// URL -> date -> hit count, in first-seen order.
pub type Aggregate = IndexMap<String, DateCounts>;

/// Everything one worker learned from its byte range.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkAggregate {
    pub counts: Aggregate,
    pub lines_read: u64,
    pub lines_skipped: u64,
}

impl ChunkAggregate {
    pub fn record(&mut self, url: &[u8], date: &[u8]) {
        self.add(String::from_utf8_lossy(url), String::from_utf8_lossy(date), 1);
    }

    pub fn add(&mut self, url: Cow<'_, str>, date: Cow<'_, str>, count: u64) {
        if let Some(dates) = self.counts.get_mut(url.as_ref()) {
            bump(dates, date, count);
        } else {
            let mut dates = DateCounts::new();
            bump(&mut dates, date, count);
            self.counts.insert(url.into_owned(), dates);
        }
    }

    pub fn pair_count(&self) -> usize {
        self.counts.values().map(|dates| dates.len()).sum()
    }
}

fn bump(dates: &mut DateCounts, date: Cow<'_, str>, count: u64) {
    if let Some(existing) = dates.get_mut(date.as_ref()) {
        *existing += count;
    } else {
        dates.insert(date.into_owned(), count);
    }
}

/// Merged counts with every URL's dates sorted ascending.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MergedResult {
    pub urls: Aggregate,
}

impl MergedResult {
    #[cfg(test)]
    pub fn get(&self, url: &str, date: &str) -> Option<u64> {
        self.urls.get(url)?.get(date).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn total_hits(&self) -> u64 {
        self.urls.values().flat_map(|dates| dates.values()).sum()
    }

    pub fn pair_count(&self) -> usize {
        self.urls.values().map(|dates| dates.len()).sum()
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub chunk_count: usize,
    pub lines_read: u64,
    pub lines_skipped: u64,
    pub unique_urls: usize,
    pub url_date_pairs: usize,
    pub total_hits: u64,
    pub elapsed: Duration,
}
