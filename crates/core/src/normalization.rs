use crate::model::IllustrationRow;

/// Rows for ages past this are projection noise and never shown.
pub const MAX_DISPLAY_AGE: u32 = 100;

/// Puts raw parser output into its stored shape.
///
/// Rows are stable-sorted by year and the first row per year is kept. Missing
/// cumulative outlays are filled from a running sum of annual premiums (a
/// missing premium counts as zero, rows that already carry an outlay still
/// add to the sum). Rows older than [`MAX_DISPLAY_AGE`] are dropped last.
/// Applying this twice changes nothing.
pub fn normalize_rows(mut rows: Vec<IllustrationRow>) -> Vec<IllustrationRow> {
    rows.sort_by_key(|row| row.year);
    rows.dedup_by_key(|row| row.year);

    let mut running_total = 0.0;
    for row in rows.iter_mut() {
        running_total += row.annual_premium.unwrap_or(0.0);
        if row.cumulative_outlay.is_none() {
            row.cumulative_outlay = Some(running_total);
        }
    }

    let before = rows.len();
    rows.retain(|row| row.age <= MAX_DISPLAY_AGE);
    if rows.len() != before {
        tracing::debug!(dropped = before - rows.len(), "dropped rows past display age");
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: u32, age: u32, premium: Option<f64>) -> IllustrationRow {
        let mut row = IllustrationRow::new(year, age);
        row.annual_premium = premium;
        row
    }

    fn outlays(rows: &[IllustrationRow]) -> Vec<Option<f64>> {
        rows.iter().map(|row| row.cumulative_outlay).collect()
    }

    #[test]
    fn cumulative_outlay_is_running_sum() {
        let rows = normalize_rows(vec![
            row(1, 45, Some(1000.0)),
            row(2, 46, Some(1000.0)),
            row(3, 47, Some(500.0)),
        ]);
        assert_eq!(outlays(&rows), vec![Some(1000.0), Some(2000.0), Some(2500.0)]);
    }

    #[test]
    fn missing_premium_counts_as_zero_and_explicit_outlay_is_kept() {
        let mut explicit = row(2, 46, Some(1000.0));
        explicit.cumulative_outlay = Some(5.0);
        let rows = normalize_rows(vec![row(3, 47, None), explicit, row(1, 45, Some(1000.0))]);
        assert_eq!(rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(outlays(&rows), vec![Some(1000.0), Some(5.0), Some(2000.0)]);
    }

    #[test]
    fn drops_rows_past_display_age() {
        let rows = normalize_rows(vec![row(55, 100, Some(1.0)), row(56, 101, Some(1.0))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].age, 100);
    }

    #[test]
    fn first_duplicate_year_wins() {
        let rows = normalize_rows(vec![row(1, 45, Some(10.0)), row(1, 45, Some(99.0))]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].annual_premium, Some(10.0));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let once = normalize_rows(vec![row(2, 46, Some(3.0)), row(1, 45, None), row(3, 120, Some(1.0))]);
        assert_eq!(normalize_rows(once.clone()), once);
    }
}
