//! Reference-range resolution for result validation.
//!
//! A test carries an ordered list of age/gender rules. Classification
//! scans that list top-to-bottom and takes the first rule whose gender
//! and age window cover the patient — declaration order decides ties, so
//! overlapping windows are legal and deliberately never reordered. When
//! no rule matches, the test's legacy flat min/max range (if fully
//! specified) is used; otherwise the value stays unclassified.

use crate::models::enums::RuleGender;
use crate::models::{ReferenceRange, TestDefinition};

/// Outcome of classifying a result value against reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Low,
    High,
    Normal,
    /// Textual value or no applicable rule. Not an error: qualitative
    /// results ("Positive") are legitimate and carry no range check.
    Unclassified,
}

impl Classification {
    /// The remark stored on the result row.
    pub fn remark(&self) -> &'static str {
        match self {
            Classification::Low => "LOW",
            Classification::High => "HIGH",
            Classification::Normal => "Normal",
            Classification::Unclassified => "",
        }
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self, Classification::Low | Classification::High)
    }
}

/// Classify a raw result value for a patient against the test's rules.
///
/// Non-numeric values are always `Unclassified`.
pub fn classify(
    test: &TestDefinition,
    rules: &[ReferenceRange],
    patient_gender: &str,
    patient_age: i64,
    raw_value: &str,
) -> Classification {
    let value: f64 = match raw_value.trim().parse() {
        Ok(v) => v,
        Err(_) => return Classification::Unclassified,
    };

    if let Some(rule) = find_matching_rule(rules, patient_gender, patient_age) {
        return classify_against(value, rule.min_val, rule.max_val);
    }

    // Legacy fallback: flat range on the test itself, only when both
    // bounds are present.
    if let (Some(min), Some(max)) = (test.min_range, test.max_range) {
        return classify_against(value, min, max);
    }

    Classification::Unclassified
}

/// First rule (in stored order) covering the patient's gender and age.
pub fn find_matching_rule<'a>(
    rules: &'a [ReferenceRange],
    patient_gender: &str,
    patient_age: i64,
) -> Option<&'a ReferenceRange> {
    rules.iter().find(|rule| {
        let gender_match = rule.gender == RuleGender::Both
            || rule.gender.as_str().eq_ignore_ascii_case(patient_gender);
        let age_match = patient_age >= rule.min_age && patient_age <= rule.max_age;
        gender_match && age_match
    })
}

fn classify_against(value: f64, min: f64, max: f64) -> Classification {
    if value < min {
        Classification::Low
    } else if value > max {
        Classification::High
    } else {
        Classification::Normal
    }
}
