//! # Fingerprints
//!
//! Non-sensitive descriptive fields used to decide whether two payment
//! methods describe the same card or bank account.
//!
//! ```text
//! card       last4 | brand | exp_year | exp_month | funding
//! ach_debit  last2 | bank_name | account_type
//! eft_debit  last2 | bank_name
//! ```
//!
//! A field only counts as equal when both sides carry a value.

use crate::payment_method::{AchDebitDetails, CardDetails, EftDebitDetails};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Borrowed view of a payment method's fingerprint fields
#[derive(Debug, Clone, Copy)]
pub enum Fingerprint<'a> {
    Card(&'a CardDetails),
    AchDebit(&'a AchDebitDetails),
    EftDebit(&'a EftDebitDetails),
}

/// Outcome of comparing two fingerprints field by field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    /// Names of the fields that are equal on both sides, in comparison order
    pub matched: Vec<&'static str>,
    /// Number of fields compared (0 when the kinds differ)
    pub compared: usize,
}

impl FieldMatch {
    fn none() -> Self {
        Self {
            matched: Vec::new(),
            compared: 0,
        }
    }

    /// True when at least one field matched
    pub fn any(&self) -> bool {
        !self.matched.is_empty()
    }

    /// True when every compared field matched
    pub fn all(&self) -> bool {
        self.compared > 0 && self.matched.len() == self.compared
    }
}

impl Fingerprint<'_> {
    /// Compare field by field against another fingerprint of the same kind
    pub fn compare(&self, other: &Fingerprint<'_>) -> FieldMatch {
        let fields: Vec<(&'static str, bool)> = match (self, other) {
            (Fingerprint::Card(a), Fingerprint::Card(b)) => vec![
                ("last4", same(&a.last4, &b.last4)),
                ("brand", same(&a.brand, &b.brand)),
                ("exp_year", same(&a.exp_year, &b.exp_year)),
                ("exp_month", same(&a.exp_month, &b.exp_month)),
                ("funding", same(&a.funding, &b.funding)),
            ],
            (Fingerprint::AchDebit(a), Fingerprint::AchDebit(b)) => vec![
                ("last2", same(&a.last2, &b.last2)),
                ("bank_name", same(&a.bank_name, &b.bank_name)),
                ("account_type", same(&a.account_type, &b.account_type)),
            ],
            (Fingerprint::EftDebit(a), Fingerprint::EftDebit(b)) => vec![
                ("last2", same(&a.last2, &b.last2)),
                ("bank_name", same(&a.bank_name, &b.bank_name)),
            ],
            _ => return FieldMatch::none(),
        };

        FieldMatch {
            compared: fields.len(),
            matched: fields
                .into_iter()
                .filter_map(|(name, eq)| eq.then_some(name))
                .collect(),
        }
    }
}

/// Equal only when both sides carry a value; a field absent on both sides
/// is not evidence of the same card or account.
fn same<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// How many fingerprint fields must agree before an existing payment method
/// is treated as the duplicate the processor reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// A single equal field is enough. Loose: two different cards of the
    /// same brand will match.
    #[default]
    AnyField,
    /// Every fingerprint field must be equal
    AllFields,
}

impl MatchPolicy {
    /// Whether a comparison result is accepted under this policy
    pub fn accepts(&self, result: &FieldMatch) -> bool {
        match self {
            MatchPolicy::AnyField => result.any(),
            MatchPolicy::AllFields => result.all(),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::AnyField => f.write_str("any"),
            MatchPolicy::AllFields => f.write_str("all"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" | "any_field" => Ok(MatchPolicy::AnyField),
            "all" | "all_fields" => Ok(MatchPolicy::AllFields),
            other => Err(format!("unknown match policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(last4: &str, brand: &str, month: u32, year: u32, funding: &str) -> CardDetails {
        CardDetails {
            last4: Some(last4.into()),
            brand: Some(brand.into()),
            exp_month: Some(month),
            exp_year: Some(year),
            funding: Some(funding.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_card_single_field_match() {
        let a = card("4242", "visa", 12, 2030, "credit");
        let b = card("4242", "mastercard", 1, 2027, "debit");

        let result = Fingerprint::Card(&a).compare(&Fingerprint::Card(&b));
        assert_eq!(result.matched, vec!["last4"]);
        assert_eq!(result.compared, 5);
        assert!(MatchPolicy::AnyField.accepts(&result));
        assert!(!MatchPolicy::AllFields.accepts(&result));
    }

    #[test]
    fn test_card_full_match() {
        let a = card("4242", "visa", 12, 2030, "credit");
        let b = a.clone();

        let result = Fingerprint::Card(&a).compare(&Fingerprint::Card(&b));
        assert!(result.all());
        assert!(MatchPolicy::AllFields.accepts(&result));
    }

    #[test]
    fn test_missing_fields_never_match() {
        let a = CardDetails::default();
        let b = CardDetails::default();

        let result = Fingerprint::Card(&a).compare(&Fingerprint::Card(&b));
        assert!(!result.any());
        assert!(!result.all());
    }

    #[test]
    fn test_different_kinds_do_not_compare() {
        let c = card("4242", "visa", 12, 2030, "credit");
        let ach = AchDebitDetails {
            last2: Some("42".into()),
            ..Default::default()
        };

        let result = Fingerprint::Card(&c).compare(&Fingerprint::AchDebit(&ach));
        assert_eq!(result.compared, 0);
        assert!(!MatchPolicy::AnyField.accepts(&result));
    }

    #[test]
    fn test_ach_bank_name_match() {
        let a = AchDebitDetails {
            last2: Some("11".into()),
            bank_name: Some("FIRST BANK".into()),
            account_type: Some("checking".into()),
            ..Default::default()
        };
        let b = AchDebitDetails {
            last2: Some("22".into()),
            bank_name: Some("FIRST BANK".into()),
            account_type: Some("savings".into()),
            ..Default::default()
        };

        let result = Fingerprint::AchDebit(&a).compare(&Fingerprint::AchDebit(&b));
        assert_eq!(result.matched, vec!["bank_name"]);
        assert_eq!(result.compared, 3);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("any".parse::<MatchPolicy>(), Ok(MatchPolicy::AnyField));
        assert_eq!("ALL".parse::<MatchPolicy>(), Ok(MatchPolicy::AllFields));
        assert!("some".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::default(), MatchPolicy::AnyField);
    }
}
