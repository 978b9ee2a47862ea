// Counting and classification of the answers of a single column.

use std::collections::HashMap;

/// How a question is rendered: a pie chart for bounded answer sets, a
/// verbatim listing for everything else.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionKind {
    Chart,
    FreeText,
}

/// Answer frequencies of one column, ordered by descending count. Ties keep
/// the order in which the answers first appear in the data.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ValueCounts {
    pub entries: Vec<(String, u64)>,
    pub total: u64,
}

impl ValueCounts {
    pub fn unique(&self) -> usize {
        self.entries.len()
    }
}

/// Exact counts of exact values. No binning, no normalization.
pub fn value_counts(values: &[&str]) -> ValueCounts {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(String, u64)> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&at) => entries[at].1 += 1,
            None => {
                index.insert(value, entries.len());
                entries.push((value.to_string(), 1));
            }
        }
    }
    // Stable sort: equal counts stay in first-occurrence order.
    entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ValueCounts {
        entries,
        total: values.len() as u64,
    }
}

/// Each distinct value once, in the order of its first occurrence.
pub fn dedup_in_order(values: &[&str]) -> Vec<String> {
    let mut seen: HashMap<&str, ()> = HashMap::new();
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if seen.insert(value, ()).is_none() {
            out.push(value.to_string());
        }
    }
    out
}

/// The chart-or-list decision for a column with `total` non-blank answers of
/// which `unique` are distinct.
///
/// The two predicates are intentionally not symmetric: a column that fails
/// the chartable test falls through to the listing, whatever the reason. In
/// particular a column where everyone gave the same answer (`unique == 1`)
/// is listed, not charted.
pub fn classify(total: u64, unique: usize, free_text_threshold: usize) -> QuestionKind {
    let likely_free_text = unique as f64 > total as f64 * 0.6
        || unique > free_text_threshold
        || total < 5;
    let chartable = !likely_free_text && unique >= 2 && unique <= 20 && total >= unique as u64;
    if chartable {
        QuestionKind::Chart
    } else {
        QuestionKind::FreeText
    }
}
