use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Element, Tag};

// Factors 20 and 21 are bare numbers; every other factor is digits plus a letter
static FACTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"20|21|\d+[A-Z]").expect("factor pattern compiles"));

/// Factor codes recovered from free text such as `"1A 2B,20"`
pub fn split_factors(raw: &str) -> Vec<String> {
    FACTOR
        .find_iter(&raw.to_uppercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrite the `AssessmentFactors` under one `FactorsIdentifiedAtAssessment`
/// as one element per recovered code. Returns how many were written.
pub fn resegment(group: &mut Element) -> usize {
    let (factors, others): (Vec<Element>, Vec<Element>) = std::mem::take(&mut group.children)
        .into_iter()
        .partition(|child| child.is(&Tag::AssessmentFactors));

    let joined = factors
        .iter()
        .filter_map(|f| f.text.as_deref())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",");

    group.children = others;
    let codes = split_factors(&joined);
    for code in &codes {
        let mut factor = Element::with_text(Tag::AssessmentFactors.as_str(), code.as_str());
        factor.namespace = group.namespace.clone();
        group.push(factor);
    }
    codes.len()
}
