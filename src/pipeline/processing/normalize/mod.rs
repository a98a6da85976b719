//! Field-level cleaning of a degraded record tree.
//!
//! One dispatcher per nesting level maps an element's tag to a [`Slot`]:
//! a field with a [`FieldKind`], a nested group with its own dispatcher,
//! the assessment factor list, or nothing. Field parameters (date patterns,
//! code tables) come from [`FieldRules`], looked up by the element's path.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::{FieldRule, FieldRules};
use crate::constants::is_invalid_value;
use crate::domain::{Element, RecordTree, Tag};
use crate::error::{CinError, Result};

pub mod factors;
pub mod rules;

use rules::{to_category, to_date, to_integer, Case, Checked};

/// How a field is cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed and re-cased; validated only if a rule is configured
    Text(Case),
    /// Must match the configured date pattern
    Date,
    /// Must resolve against the configured code table
    Category(Case),
    /// Must parse as an integer
    Integer,
}

/// What a dispatcher decides for one child element
#[derive(Clone, Copy)]
pub enum Slot {
    Field(FieldKind),
    Group(Dispatch),
    /// `FactorsIdentifiedAtAssessment`, rebuilt rather than validated
    Factors,
    /// Present where only one kind of child is expected; kept but flagged
    Unexpected,
    Skip,
}

pub type Dispatch = fn(&Tag) -> Slot;

/// Per-tree cleaning counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    /// Values that passed validation
    pub normalized: usize,
    /// Values replaced by the invalid marker
    pub invalid: usize,
    /// Null fields removed from the tree
    pub removed: usize,
    /// Unexpected children found in flagged groups
    pub unexpected: usize,
    /// Assessment factors written after re-segmentation
    pub factors: usize,
}

impl CleaningStats {
    pub fn merge(&mut self, other: &CleaningStats) {
        self.normalized += other.normalized;
        self.invalid += other.invalid;
        self.removed += other.removed;
        self.unexpected += other.unexpected;
        self.factors += other.factors;
    }
}

// ---- dispatchers, one per level ----

fn child_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::ChildIdentifiers => Slot::Group(identifiers_slot),
        Tag::ChildCharacteristics => Slot::Group(characteristics_slot),
        Tag::CinDetails => Slot::Group(cin_details_slot),
        _ => Slot::Skip,
    }
}

fn identifiers_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::LaChildId => Slot::Field(FieldKind::Text(Case::Keep)),
        Tag::Upn | Tag::FormerUpn => Slot::Field(FieldKind::Text(Case::Upper)),
        Tag::UpnUnknown => Slot::Field(FieldKind::Category(Case::Upper)),
        // Already reduced to a year by the degrader
        Tag::PersonBirthDate => Slot::Field(FieldKind::Text(Case::Keep)),
        Tag::PersonSchoolYear => Slot::Field(FieldKind::Integer),
        Tag::ExpectedPersonBirthDate | Tag::PersonDeathDate => Slot::Field(FieldKind::Date),
        Tag::GenderCurrent => Slot::Field(FieldKind::Category(Case::Keep)),
        _ => Slot::Skip,
    }
}

fn characteristics_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::Ethnicity => Slot::Field(FieldKind::Category(Case::Upper)),
        Tag::Disabilities => Slot::Group(disabilities_slot),
        _ => Slot::Skip,
    }
}

fn disabilities_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::Disability => Slot::Field(FieldKind::Category(Case::Upper)),
        _ => Slot::Unexpected,
    }
}

fn cin_details_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::CinReferralDate | Tag::CinClosureDate | Tag::DateOfInitialCpc => Slot::Field(FieldKind::Date),
        Tag::ReferralSource | Tag::PrimaryNeedCode | Tag::ReasonForClosure => {
            Slot::Field(FieldKind::Category(Case::Upper))
        }
        Tag::ReferralNfa => Slot::Field(FieldKind::Category(Case::Capitalize)),
        Tag::Assessments => Slot::Group(assessments_slot),
        Tag::Section47 => Slot::Group(section47_slot),
        Tag::ChildProtectionPlans => Slot::Group(protection_plans_slot),
        _ => Slot::Skip,
    }
}

fn assessments_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::AssessmentActualStartDate | Tag::AssessmentInternalReviewDate | Tag::AssessmentAuthorisationDate => {
            Slot::Field(FieldKind::Date)
        }
        Tag::FactorsIdentifiedAtAssessment => Slot::Factors,
        _ => Slot::Skip,
    }
}

fn section47_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::S47ActualStartDate | Tag::InitialCpcTarget | Tag::DateOfInitialCpc => Slot::Field(FieldKind::Date),
        Tag::IcpcNotRequired => Slot::Field(FieldKind::Category(Case::Capitalize)),
        _ => Slot::Skip,
    }
}

fn protection_plans_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::CppStartDate | Tag::CppEndDate => Slot::Field(FieldKind::Date),
        Tag::InitialCategoryOfAbuse | Tag::LatestCategoryOfAbuse => Slot::Field(FieldKind::Category(Case::Upper)),
        Tag::NumberOfPreviousCpp => Slot::Field(FieldKind::Integer),
        Tag::Reviews => Slot::Group(reviews_slot),
        _ => Slot::Skip,
    }
}

fn reviews_slot(tag: &Tag) -> Slot {
    match tag {
        Tag::CppReviewDate => Slot::Field(FieldKind::Date),
        _ => Slot::Unexpected,
    }
}

/// Cleans every child of a tree against a set of field rules
pub struct Cleaner<'a> {
    rules: &'a FieldRules,
    stats: CleaningStats,
}

impl<'a> Cleaner<'a> {
    pub fn new(rules: &'a FieldRules) -> Self {
        Self {
            rules,
            stats: CleaningStats::default(),
        }
    }

    #[instrument(skip(self, tree), fields(file = %tree.name))]
    pub fn clean(mut self, tree: &mut RecordTree) -> Result<CleaningStats> {
        let context = tree.name.clone();
        let children = tree.children_mut().ok_or_else(|| CinError::MissingElement {
            element: Tag::Children.to_string(),
            context,
        })?;

        for child in children.children.iter_mut() {
            self.clean_group(child, &[], child_slot)?;
        }

        info!(
            normalized = self.stats.normalized,
            invalid = self.stats.invalid,
            removed = self.stats.removed,
            unexpected = self.stats.unexpected,
            "cleaned tree"
        );
        Ok(self.stats)
    }

    fn clean_group(&mut self, group: &mut Element, path: &[&str], dispatch: Dispatch) -> Result<()> {
        let children = std::mem::take(&mut group.children);
        let mut kept = Vec::with_capacity(children.len());

        for mut child in children {
            let name = child.name.clone();
            let mut child_path = path.to_vec();
            child_path.push(name.as_str());

            match dispatch(&child.tag()) {
                Slot::Field(kind) => {
                    // A field that was not reported cannot be normalized
                    if child.text.is_none() {
                        debug!(field = %child_path.join("/"), "removing null field");
                        self.stats.removed += 1;
                        continue;
                    }
                    self.clean_field(&mut child, kind, &child_path)?;
                }
                Slot::Group(inner) => self.clean_group(&mut child, &child_path, inner)?,
                Slot::Factors => self.stats.factors += factors::resegment(&mut child),
                Slot::Unexpected => {
                    warn!(parent = %group.name, element = %name, "unexpected element");
                    self.stats.unexpected += 1;
                }
                Slot::Skip => {}
            }
            kept.push(child);
        }

        group.children = kept;
        Ok(())
    }

    fn clean_field(&mut self, field: &mut Element, kind: FieldKind, path: &[&str]) -> Result<()> {
        let rules = self.rules;
        let Some(raw) = field.text.as_deref() else {
            return Ok(());
        };
        let value = raw.trim();
        // Flagged by an earlier pass; wrapping it again would hide the original
        if is_invalid_value(value) {
            self.stats.invalid += 1;
            return Ok(());
        }

        let checked = match kind {
            FieldKind::Text(case) => {
                let value = case.apply(value);
                match rules.lookup(path) {
                    Some(FieldRule::Integer(true)) => to_integer(&value),
                    Some(FieldRule::Date(pattern)) => to_date(&value, pattern),
                    Some(FieldRule::Category(codes)) => to_category(&value, codes),
                    _ => Checked::Valid(value),
                }
            }
            FieldKind::Date => to_date(value, rules.date_pattern(path)?),
            FieldKind::Category(case) => to_category(&case.apply(value), rules.categories(path)?),
            FieldKind::Integer => to_integer(value),
        };

        let checked = if checked.is_valid() {
            self.stats.normalized += 1;
            checked
        } else {
            debug!(field = %path.join("/"), "value failed validation");
            self.stats.invalid += 1;
            // The marker carries the value as reported, before re-casing
            Checked::Invalid(value.to_string())
        };
        field.text = Some(checked.into_text());
        Ok(())
    }
}

/// Check that every date and category field the cleaner knows about has a
/// rule of the right shape, reporting all gaps at once
pub fn validate_rules(rules: &FieldRules) -> Result<()> {
    let mut problems = Vec::new();
    collect_rule_problems(rules, &[], child_slot, &mut problems);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CinError::Config(problems.join("; ")))
    }
}

fn collect_rule_problems(rules: &FieldRules, path: &[&str], dispatch: Dispatch, problems: &mut Vec<String>) {
    for tag in Tag::ALL {
        let mut tag_path = path.to_vec();
        tag_path.push(tag.as_str());
        let outcome = match dispatch(tag) {
            Slot::Field(FieldKind::Date) => rules.date_pattern(&tag_path).map(|_| ()),
            Slot::Field(FieldKind::Category(_)) => rules.categories(&tag_path).map(|_| ()),
            Slot::Group(inner) => {
                collect_rule_problems(rules, &tag_path, inner, problems);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            problems.push(e.to_string());
        }
    }
}

/// Clean one tree with `rules`
pub fn clean_tree(tree: &mut RecordTree, rules: &FieldRules) -> Result<CleaningStats> {
    Cleaner::new(rules).clean(tree)
}
