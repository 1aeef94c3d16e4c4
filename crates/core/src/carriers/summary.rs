use regex::Regex;

use crate::tokens::{extract_amounts, parse_number};

/// Which surviving amount a section rule keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Last,
    Max,
}

/// A labeled section of a flattened summary page and how to read one amount
/// out of it.
#[derive(Debug, Clone)]
pub struct SectionRule {
    pub anchor: Regex,
    /// Maximum characters between the end of the anchor and the section end.
    pub window: usize,
    pub terminators: Regex,
    pub min: f64,
    pub max: f64,
    pub pick: Pick,
}

impl SectionRule {
    pub fn extract(&self, text: &str) -> Option<f64> {
        let section = bounded_section(text, &self.anchor, self.window, &self.terminators)?;
        let amounts = extract_amounts(section)
            .into_iter()
            .filter(|amount| (self.min..=self.max).contains(amount));
        match self.pick {
            Pick::Last => amounts.last(),
            Pick::Max => amounts.reduce(f64::max),
        }
    }
}

/// Finds the first anchor match whose section ends within `window` characters.
///
/// A section runs from the anchor start to the leftmost terminator that starts
/// no more than `window` characters after the anchor, or to the end of the text
/// when that is close enough. Anchors with neither are skipped.
pub fn bounded_section<'t>(
    text: &'t str,
    anchor: &Regex,
    window: usize,
    terminators: &Regex,
) -> Option<&'t str> {
    for found in anchor.find_iter(text) {
        let body_start = found.end();
        let limit = text[body_start..]
            .char_indices()
            .nth(window)
            .map(|(offset, _)| body_start + offset);
        let terminator = terminators
            .find_at(text, body_start)
            .map(|m| m.start())
            .filter(|start| limit.map_or(true, |limit| *start <= limit));
        match (terminator, limit) {
            (Some(end), _) => return Some(&text[found.start()..end]),
            (None, None) => return Some(&text[found.start()..]),
            (None, Some(_)) => continue,
        }
    }
    None
}

/// Parsed first capture group of `re` in `text`.
pub fn capture_amount(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

/// First pattern in `chain` that matches, parsed.
pub fn first_capture(chain: &[&Regex], text: &str) -> Option<f64> {
    chain.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| parse_number(m.as_str()))
    })?
}

/// Treats zero like a missing value.
pub fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(anchor: &str, window: usize, terminators: &str, min: f64, max: f64, pick: Pick) -> SectionRule {
        SectionRule {
            anchor: Regex::new(anchor).unwrap(),
            window,
            terminators: Regex::new(terminators).unwrap(),
            min,
            max,
            pick,
        }
    }

    #[test]
    fn section_stops_at_first_terminator() {
        let text = "Base Policy 10.00 4,565.01 Level Premium PUA Rider 5,000.00";
        let re = rule(r"(?i)Base\s+Policy", 350, r"(?i)Level\s+Premium", 100.0, 50000.0, Pick::Last);
        assert_eq!(re.extract(text), Some(4565.01));
    }

    #[test]
    fn section_runs_to_end_when_close() {
        let anchor = Regex::new("Rider").unwrap();
        let stop = Regex::new("Total").unwrap();
        assert_eq!(bounded_section("x Rider 1.00", &anchor, 10, &stop), Some("Rider 1.00"));
        assert_eq!(bounded_section("x Rider 1.00 and much more text", &anchor, 10, &stop), None);
    }

    #[test]
    fn later_anchor_used_when_first_overruns() {
        let anchor = Regex::new("Rider").unwrap();
        let stop = Regex::new("Total").unwrap();
        let text = "Rider aaaaaaaaaaaaaaaaaaaa Rider 2.00 Total";
        assert_eq!(bounded_section(text, &anchor, 10, &stop), Some("Rider 2.00 "));
    }

    #[test]
    fn max_pick_ignores_out_of_range() {
        let text = "Level Premium PUA Rider 99.00 1,200.00 300.00 Total Minimum";
        let re = rule(
            r"(?i)Level\s+Premium\s+PUA\s+Rider",
            200,
            r"(?i)Total\s+Minimum",
            100.0,
            100000.0,
            Pick::Max,
        );
        assert_eq!(re.extract(text), Some(1200.0));
    }

    #[test]
    fn capture_chain_takes_first_match() {
        let a = Regex::new(r"OYT[^$]*\$([0-9,]+\.\d{2})").unwrap();
        let b = Regex::new(r"Premium\s*\$([0-9,]+\.\d{2})").unwrap();
        let text = "Annual Premium $8,250.00 OYT rider $581.56";
        assert_eq!(first_capture(&[&a, &b], text), Some(581.56));
        assert_eq!(capture_amount(&b, text), Some(8250.0));
        assert_eq!(first_capture(&[], text), None);
    }
}
