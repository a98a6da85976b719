use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::domain::{Element, RecordTree, Tag};

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern compiles"));

/// Layouts a full birthdate is read with, after `/` and `.` become `-`
const BIRTHDATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%Y%m%d"];

/// Counts reported per file in the degradation log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationStats {
    /// `PersonBirthDate` elements seen
    pub found: usize,
    /// Reduced to year of birth plus school year
    pub degraded: usize,
    /// Dropped because no year could be read from them
    pub removed: usize,
}

impl DegradationStats {
    pub fn merge(&mut self, other: &DegradationStats) {
        self.found += other.found;
        self.degraded += other.degraded;
        self.removed += other.removed;
    }

    /// One-line summary used in the per-region report
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} PersonBirthDate events were found, of which {} were degraded to year of birth and school year",
            self.found, self.degraded
        );
        if self.removed > 0 {
            line.push_str(&format!(" and {} without a readable year were removed", self.removed));
        }
        line
    }
}

/// What happens to one birthdate value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Birthdate {
    /// Null, or already no longer than a year
    Unchanged,
    /// A padded bare year, trimmed back to the year
    Trimmed(String),
    /// A full date reduced to its year, plus the derived school year
    Degraded { year: String, school_year: i32 },
    /// Longer than a year but with no four-digit run in it
    Unreadable,
}

/// Reduce a single birthdate value to year of birth and school year
pub fn degrade_birthdate(text: Option<&str>) -> Birthdate {
    let Some(text) = text else {
        return Birthdate::Unchanged;
    };
    if text.chars().count() <= 4 {
        return Birthdate::Unchanged;
    }

    let normalized = text.trim().replace(['/', '.'], "-");
    let Some(found) = YEAR.find(&normalized) else {
        return Birthdate::Unreadable;
    };
    let year_text = found.as_str().to_string();
    if normalized == year_text {
        return Birthdate::Trimmed(year_text);
    }

    // Four ASCII digits always fit an i32
    let year: i32 = year_text.parse().unwrap_or_default();
    Birthdate::Degraded {
        school_year: school_year(&normalized, year),
        year: year_text,
    }
}

/// UK school year of a child born on `birthdate` in `year`.
///
/// Children born after 31 August start school with that year's cohort,
/// everyone else with the previous one.
pub fn school_year(birthdate: &str, year: i32) -> i32 {
    let cutoff = NaiveDate::from_ymd_opt(year, 8, 31);
    match (parse_birthdate(birthdate), cutoff) {
        (Some(date), Some(cutoff)) => {
            if date > cutoff {
                year
            } else {
                year - 1
            }
        }
        // Unparseable layouts fall back to comparing text with the ISO cutoff
        _ => {
            if birthdate > format!("{}-08-31", year).as_str() {
                year
            } else {
                year - 1
            }
        }
    }
}

fn parse_birthdate(value: &str) -> Option<NaiveDate> {
    // Ignore any time component
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    BIRTHDATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Rewrites every birthdate in a tree, in place
pub struct Degrader;

impl Degrader {
    #[instrument(skip(tree), fields(file = %tree.name))]
    pub fn degrade(tree: &mut RecordTree) -> DegradationStats {
        let mut stats = DegradationStats::default();
        degrade_element(&mut tree.root, &mut stats);
        info!("{}", stats.summary());
        stats
    }
}

fn degrade_element(element: &mut Element, stats: &mut DegradationStats) {
    let mut school_years = Vec::new();
    let mut unreadable = Vec::new();

    for (index, child) in element.children.iter_mut().enumerate() {
        if !child.is(&Tag::PersonBirthDate) {
            continue;
        }
        stats.found += 1;
        match degrade_birthdate(child.text.as_deref()) {
            Birthdate::Unchanged => {}
            Birthdate::Trimmed(year) => child.text = Some(year),
            Birthdate::Degraded { year, school_year } => {
                child.text = Some(year);
                school_years.push(child.sibling(Tag::PersonSchoolYear.as_str(), school_year.to_string()));
                stats.degraded += 1;
            }
            Birthdate::Unreadable => unreadable.push(index),
        }
    }

    if !unreadable.is_empty() {
        // The value itself is never logged
        warn!("removing {} birthdate(s) with no readable year under <{}>", unreadable.len(), element.name);
        stats.removed += unreadable.len();
        let mut index = 0;
        element.children.retain(|_| {
            let keep = !unreadable.contains(&index);
            index += 1;
            keep
        });
    }
    element.children.extend(school_years);

    for child in element.children.iter_mut() {
        degrade_element(child, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::parser::parse_str;

    fn tree_with_birthdates(dates: &[&str]) -> RecordTree {
        let children: String = dates
            .iter()
            .map(|d| {
                format!(
                    "<Child><ChildIdentifiers><LAchildID>1</LAchildID><PersonBirthDate>{}</PersonBirthDate></ChildIdentifiers></Child>",
                    d
                )
            })
            .collect();
        parse_str("la.xml", &format!("<Message><Children>{}</Children></Message>", children)).unwrap()
    }

    fn identifiers(tree: &RecordTree, n: usize) -> &Element {
        tree.children().unwrap().children[n]
            .child(&Tag::ChildIdentifiers)
            .unwrap()
    }

    #[test]
    fn test_school_year_uses_31_august_cutoff() {
        assert_eq!(school_year("2015-09-01", 2015), 2015);
        assert_eq!(school_year("2015-08-31", 2015), 2014);
        assert_eq!(school_year("2015-01-01", 2015), 2014);
        assert_eq!(school_year("01-09-2015", 2015), 2015);
        assert_eq!(school_year("2015-12-24T00:00:00", 2015), 2015);
        assert_eq!(school_year("20150101", 2015), 2014);
        assert_eq!(school_year("20150901", 2015), 2015);
    }

    #[test]
    fn test_full_date_becomes_year_and_school_year() {
        assert_eq!(
            degrade_birthdate(Some("2015/09/01")),
            Birthdate::Degraded { year: "2015".into(), school_year: 2015 }
        );
        assert_eq!(
            degrade_birthdate(Some("31/08/2015")),
            Birthdate::Degraded { year: "2015".into(), school_year: 2014 }
        );
        assert_eq!(
            degrade_birthdate(Some("20150101")),
            Birthdate::Degraded { year: "2015".into(), school_year: 2014 }
        );
        assert_eq!(
            degrade_birthdate(Some("2015.01.01")),
            Birthdate::Degraded { year: "2015".into(), school_year: 2014 }
        );
        assert_eq!(
            degrade_birthdate(Some("02.09.2015")),
            Birthdate::Degraded { year: "2015".into(), school_year: 2015 }
        );
    }

    #[test]
    fn test_short_and_unreadable_values() {
        assert_eq!(degrade_birthdate(Some("2015")), Birthdate::Unchanged);
        assert_eq!(degrade_birthdate(Some("abcd")), Birthdate::Unchanged);
        assert_eq!(degrade_birthdate(None), Birthdate::Unchanged);
        assert_eq!(degrade_birthdate(Some(" 2015 ")), Birthdate::Trimmed("2015".into()));
        assert_eq!(degrade_birthdate(Some("01-09-15")), Birthdate::Unreadable);
    }

    #[test]
    fn test_degrade_rewrites_tree_and_adds_school_year() {
        let mut tree = tree_with_birthdates(&["2015-09-01", "2010-03-15"]);
        let stats = Degrader::degrade(&mut tree);
        assert_eq!(stats, DegradationStats { found: 2, degraded: 2, removed: 0 });

        let first = identifiers(&tree, 0);
        assert_eq!(first.child(&Tag::PersonBirthDate).unwrap().text.as_deref(), Some("2015"));
        assert_eq!(first.child(&Tag::PersonSchoolYear).unwrap().text.as_deref(), Some("2015"));

        let second = identifiers(&tree, 1);
        assert_eq!(second.child(&Tag::PersonBirthDate).unwrap().text.as_deref(), Some("2010"));
        assert_eq!(second.child(&Tag::PersonSchoolYear).unwrap().text.as_deref(), Some("2009"));
    }

    #[test]
    fn test_degrade_is_idempotent() {
        let mut once = tree_with_birthdates(&["2015-09-01", "2016", "2011-08-31"]);
        Degrader::degrade(&mut once);
        let mut twice = once.clone();
        let stats = Degrader::degrade(&mut twice);

        assert_eq!(twice, once);
        assert_eq!(stats.found, 3);
        assert_eq!(stats.degraded, 0);
    }

    #[test]
    fn test_unreadable_birthdate_is_removed() {
        let mut tree = tree_with_birthdates(&["unknown date"]);
        let stats = Degrader::degrade(&mut tree);
        assert_eq!(stats, DegradationStats { found: 1, degraded: 0, removed: 1 });
        assert!(identifiers(&tree, 0).child(&Tag::PersonBirthDate).is_none());
        assert!(identifiers(&tree, 0).child(&Tag::LaChildId).is_some());
    }

    #[test]
    fn test_summary_matches_report_wording() {
        let stats = DegradationStats { found: 3, degraded: 2, removed: 0 };
        assert_eq!(
            stats.summary(),
            "3 PersonBirthDate events were found, of which 2 were degraded to year of birth and school year"
        );
    }
}
