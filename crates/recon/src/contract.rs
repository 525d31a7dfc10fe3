//! Contract identifier repair.
//!
//! Some statement periods drop the 3-character segment prefix from contract
//! numbers. A bare number of the configured length gets the prefix of the
//! rule covering its position in the batch; anything else passes through.

use serde::Deserialize;

/// Stand-in identifier for a row with no contract cell.
pub const PLACEHOLDER: &str = " ";

/// Prefix for batch ordinals in `start..end` (`end = None` is open-ended).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixRule {
    pub start: usize,
    #[serde(default)]
    pub end: Option<usize>,
    pub prefix: String,
}

impl PrefixRule {
    pub fn covers(&self, ordinal: usize) -> bool {
        ordinal >= self.start && self.end.map_or(true, |end| ordinal < end)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractFormat {
    /// Length of an identifier that is missing its prefix.
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Ordered, non-overlapping; checked by config validation.
    #[serde(default)]
    pub prefix_rules: Vec<PrefixRule>,
}

fn default_length() -> usize {
    11
}

fn default_delimiter() -> String {
    "-".into()
}

impl Default for ContractFormat {
    fn default() -> Self {
        Self {
            length: default_length(),
            delimiter: default_delimiter(),
            prefix_rules: Vec::new(),
        }
    }
}

impl ContractFormat {
    pub fn prefix_for(&self, ordinal: usize) -> Option<&str> {
        self.prefix_rules
            .iter()
            .find(|r| r.covers(ordinal))
            .map(|r| r.prefix.as_str())
    }
}

/// Canonical identifier for `raw` found at 0-based `ordinal` in its batch.
pub fn normalize_contract(raw: Option<&str>, ordinal: usize, format: &ContractFormat) -> String {
    let Some(token) = raw else {
        return PLACEHOLDER.to_string();
    };

    if token.chars().count() != format.length {
        return token.to_string();
    }

    match format.prefix_for(ordinal) {
        Some(prefix) => format!("{prefix}{}{token}", format.delimiter),
        None => {
            log::debug!("no prefix rule covers ordinal {ordinal}; keeping '{token}'");
            token.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn format() -> ContractFormat {
        ContractFormat {
            length: 11,
            delimiter: "-".into(),
            prefix_rules: vec![
                PrefixRule { start: 0, end: Some(9), prefix: "001".into() },
                PrefixRule { start: 9, end: None, prefix: "040".into() },
            ],
        }
    }

    #[test]
    fn missing_token_is_placeholder() {
        assert_eq!(normalize_contract(None, 0, &format()), " ");
    }

    #[test]
    fn prefix_follows_ordinal() {
        let f = format();
        assert_eq!(normalize_contract(Some("12345678901"), 0, &f), "001-12345678901");
        assert_eq!(normalize_contract(Some("12345678901"), 8, &f), "001-12345678901");
        assert_eq!(normalize_contract(Some("12345678901"), 9, &f), "040-12345678901");
        assert_eq!(normalize_contract(Some("12345678901"), 500, &f), "040-12345678901");
    }

    #[test]
    fn other_lengths_pass_through() {
        let f = format();
        assert_eq!(normalize_contract(Some("001-12345678901"), 0, &f), "001-12345678901");
        assert_eq!(normalize_contract(Some("ABC"), 3, &f), "ABC");
    }

    #[test]
    fn uncovered_ordinal_passes_through() {
        let f = ContractFormat {
            prefix_rules: vec![PrefixRule { start: 0, end: Some(2), prefix: "001".into() }],
            ..format()
        };
        assert_eq!(normalize_contract(Some("12345678901"), 5, &f), "12345678901");
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(body in "[0-9]{8,14}", ordinal in 0usize..40) {
            let f = format();
            let once = normalize_contract(Some(&body), ordinal, &f);
            let twice = normalize_contract(Some(&once), ordinal, &f);
            prop_assert_eq!(once, twice);
        }
    }
}
