use once_cell::sync::Lazy;
use regex::Regex;

/// Decimal dollar amounts as they appear in narrative pages: `1,234.56` or `1234.56`.
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})*\.\d{2}|\d+\.\d{2})").expect("valid amount regex")
});

/// Splits a reconstructed line into numeric tokens.
///
/// Every whitespace-separated piece is reduced to the characters `[0-9,.-]`;
/// pieces left without a digit are dropped. Order is preserved, so carrier
/// layouts can index into the result positionally.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|piece| {
            piece
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
                .collect::<String>()
        })
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
        .collect()
}

/// Parses a loosely formatted number (`$1,234.56`, `12 500`, `-3`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// All decimal amounts in `text`, in order of appearance.
pub fn extract_amounts(text: &str) -> Vec<f64> {
    AMOUNT_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| parse_number(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_keeps_numeric_pieces() {
        assert_eq!(
            tokenize("Age 45 $1,234.56 N/A"),
            vec!["45".to_string(), "1,234.56".to_string()]
        );
    }

    #[test]
    fn tokenize_drops_lone_symbols() {
        assert!(tokenize("$ -- , Total").is_empty());
        assert_eq!(tokenize("(2,500) 3%"), vec!["2,500", "3"]);
    }

    #[test]
    fn parse_number_strips_formatting() {
        assert_eq!(parse_number("$1,234.56"), Some(1234.56));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1.2.3"), None);
    }

    #[test]
    fn amounts_require_cents() {
        let text = "Base Policy 10 Year 4,565.01 and 2024 then 300.00";
        assert_eq!(extract_amounts(text), vec![4565.01, 300.0]);
    }
}
