use std::collections::BTreeMap;

use crate::document::TextFragment;

/// Rebuilds visual lines from positioned fragments.
///
/// Fragments share a line when their `y` rounds to the same integer. Lines are
/// returned top of page first (descending `y`), fragments within a line left to
/// right, joined by single spaces. Blank fragments are dropped.
pub fn reconstruct_lines(fragments: &[TextFragment]) -> Vec<String> {
    let mut buckets: BTreeMap<i64, Vec<&TextFragment>> = BTreeMap::new();
    for fragment in fragments {
        if fragment.text.trim().is_empty() {
            continue;
        }
        buckets
            .entry(round_half_up(fragment.y))
            .or_default()
            .push(fragment);
    }
    buckets
        .into_iter()
        .rev()
        .map(|(_, mut items)| {
            items.sort_by(|a, b| a.x.total_cmp(&b.x));
            items
                .iter()
                .map(|fragment| fragment.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

// Half-way values round toward +inf, so -2.5 and 2.5 land on -2 and 3.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
