use proptest::prelude::*;
use illustra_core::{
    normalize_rows, parse_number, reconstruct_lines, solve_irr, IllustrationRow, TextFragment,
    MAX_DISPLAY_AGE,
};

proptest! {
    #[test]
    fn normalization_is_idempotent(rows in row_vec()) {
        let once = normalize_rows(rows);
        let twice = normalize_rows(once.clone());
        prop_assert_eq!(&once, &twice);

        for pair in once.windows(2) {
            prop_assert!(pair[0].year < pair[1].year);
        }
        for row in &once {
            prop_assert!(row.age <= MAX_DISPLAY_AGE);
            if row.annual_premium.is_some() {
                prop_assert!(row.cumulative_outlay.is_some());
            }
        }
    }

    #[test]
    fn reconstruction_keeps_every_word(fragments in fragment_vec()) {
        let lines = reconstruct_lines(&fragments);
        let words: usize = lines.iter().map(|line| line.split(' ').count()).sum();
        prop_assert_eq!(words, fragments.len());
        prop_assert_eq!(reconstruct_lines(&fragments), lines);
    }

    #[test]
    fn grouped_thousands_parse_back(value in 0u64..10_000_000_000) {
        prop_assert_eq!(parse_number(&group_thousands(value)), Some(value as f64));
        let with_cents = format!("${}.25", group_thousands(value));
        prop_assert_eq!(parse_number(&with_cents), Some(value as f64 + 0.25));
    }

    #[test]
    fn irr_stays_clamped(flows in prop::collection::vec(-50_000.0f64..50_000.0, 1..30)) {
        if let Some(rate) = solve_irr(&flows) {
            prop_assert!((-0.99..=10.0).contains(&rate));
        }
    }
}

fn row_vec() -> impl Strategy<Value = Vec<IllustrationRow>> {
    prop::collection::vec(
        (
            1u32..60,
            18u32..121,
            prop::option::of(0.0f64..50_000.0),
            prop::option::of(0.0f64..500_000.0),
            prop::option::of(0.0f64..2_000_000.0),
        ),
        0..40,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(year, age, premium, outlay, cash_value)| {
                let mut row = IllustrationRow::new(year, age);
                row.annual_premium = premium;
                row.cumulative_outlay = outlay;
                row.cash_value = cash_value;
                row
            })
            .collect()
    })
}

fn fragment_vec() -> impl Strategy<Value = Vec<TextFragment>> {
    prop::collection::vec(("[A-Za-z0-9,.$]{1,8}", 0.0f64..600.0, 0.0f64..800.0), 0..60)
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(text, x, y)| TextFragment::new(text, x, y))
                .collect()
        })
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
