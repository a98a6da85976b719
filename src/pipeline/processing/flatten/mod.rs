//! Reshape cleaned record trees into one row per dated event.

use tracing::{debug, info, instrument};

use crate::config::FlattenConfig;
use crate::constants::{
    CHILD_ID_COLUMN, CPP_REVIEW_COLUMN, DATE_COLUMN, FACTORS_COLUMN, REFERRAL_SOURCE_COLUMN, TYPE_COLUMN,
};
use crate::domain::{Element, RecordTree, Tag};
use crate::error::{CinError, Result};

pub mod table;

pub use table::{RecordTable, Row};

/// Values broadcast onto every row of one child, in document order.
/// `None` means the element was present but carried no value.
type ChildFields = Vec<(String, Option<String>)>;

/// A deduplicated flat table and how many event rows it was built from
#[derive(Debug, Clone)]
pub struct FlatTable {
    pub table: RecordTable,
    pub rows_before_dedup: usize,
}

impl FlatTable {
    pub fn duplicates_dropped(&self) -> usize {
        self.rows_before_dedup - self.table.len()
    }
}

/// Flatten, deduplicate and order columns in one go
pub fn build_record_table(trees: &[RecordTree], config: &FlattenConfig) -> Result<FlatTable> {
    let mut table = collect_rows(trees, config)?;
    let rows_before_dedup = table.len();
    table.deduplicate();
    table.lead_columns(&[CHILD_ID_COLUMN, DATE_COLUMN, TYPE_COLUMN]);
    Ok(FlatTable {
        table,
        rows_before_dedup,
    })
}

/// Every event row of every child across `trees`, before deduplication
fn collect_rows(trees: &[RecordTree], config: &FlattenConfig) -> Result<RecordTable> {
    let events: Vec<Tag> = config.events.iter().map(|name| Tag::from_local_name(name)).collect();
    let mut table = RecordTable::new();

    for (index, tree) in trees.iter().enumerate() {
        info!("extracting file {} of {} ({})", index + 1, trees.len(), tree.name);
        let children = tree.children().ok_or_else(|| CinError::MissingElement {
            element: Tag::Children.to_string(),
            context: tree.name.clone(),
        })?;
        for child in &children.children {
            flatten_child(child, &events, &mut table);
        }
    }

    Ok(table)
}

/// Append the rows of one `Child` to `table`
#[instrument(level = "debug", skip_all)]
fn flatten_child(child: &Element, events: &[Tag], table: &mut RecordTable) {
    let (Some(identifiers), Some(characteristics), Some(details)) = (
        child.child(&Tag::ChildIdentifiers),
        child.child(&Tag::ChildCharacteristics),
        child.child(&Tag::CinDetails),
    ) else {
        debug!("skipping child without identifiers, characteristics and CIN details");
        return;
    };

    let mut rows = Vec::new();
    for tag in events {
        for (parent, event) in details.descendants_with_parent(tag) {
            rows.push(event_row(parent, event, table));
        }
    }
    if rows.is_empty() {
        return;
    }

    let mut broadcast = identifier_fields(identifiers);
    broadcast.extend(characteristic_fields(characteristics));
    for (column, value) in &broadcast {
        table.register(column);
        for row in rows.iter_mut() {
            match value {
                Some(value) => {
                    row.insert(column.clone(), value.clone());
                }
                None => {
                    row.remove(column);
                }
            }
        }
    }

    forward_fill(&mut rows, REFERRAL_SOURCE_COLUMN);
    table.rows.extend(rows);
}

/// One row for `event`: its date and type, every leaf at its level and,
/// for assessments and protection plans, the joined nested lists
fn event_row(parent: &Element, event: &Element, table: &mut RecordTable) -> Row {
    let mut row = Row::new();
    let mut set = |column: &str, value: Option<&str>| {
        table.register(column);
        if let Some(value) = value {
            row.insert(column.to_string(), value.to_string());
        }
    };

    set(DATE_COLUMN, event.text.as_deref());
    set(TYPE_COLUMN, Some(event.name.as_str()));
    for sibling in parent.children.iter().filter(|s| s.is_leaf()) {
        set(sibling.name.as_str(), sibling.text.as_deref());
    }
    if parent.is(&Tag::Assessments) {
        set(FACTORS_COLUMN, Some(parent.joined_descendant_text(&Tag::AssessmentFactors).as_str()));
    }
    if parent.is(&Tag::ChildProtectionPlans) {
        set(CPP_REVIEW_COLUMN, Some(parent.joined_descendant_text(&Tag::CppReviewDate).as_str()));
    }
    row
}

fn identifier_fields(identifiers: &Element) -> ChildFields {
    identifiers
        .children
        .iter()
        .map(|field| (field.name.clone(), field.text.clone()))
        .collect()
}

fn characteristic_fields(characteristics: &Element) -> ChildFields {
    let mut fields = ChildFields::new();
    for group in &characteristics.children {
        match group.tag() {
            Tag::Ethnicity => fields.push((group.name.clone(), group.text.clone())),
            Tag::Disabilities => fields.push((
                group.name.clone(),
                Some(characteristics.joined_descendant_text(&Tag::Disability)),
            )),
            _ => {}
        }
    }
    fields
}

/// Carry the last present value of `column` down onto later rows that lack it
fn forward_fill(rows: &mut [Row], column: &str) {
    let mut last: Option<String> = None;
    for row in rows.iter_mut() {
        match row.get(column) {
            Some(value) => last = Some(value.clone()),
            None => {
                if let Some(value) = &last {
                    row.insert(column.to_string(), value.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::parser::parse_str;

    const CHILD_A: &str = r#"
      <Child>
        <ChildIdentifiers><LAchildID>A1</LAchildID><PersonBirthDate>2015</PersonBirthDate><GenderCurrent>1</GenderCurrent></ChildIdentifiers>
        <ChildCharacteristics><Ethnicity>WBRI</Ethnicity><Disabilities><Disability>MOB</Disability><Disability> VIS </Disability></Disabilities></ChildCharacteristics>
        <CINdetails>
          <CINreferralDate>2020-01-01</CINreferralDate>
          <ReferralSource>1A</ReferralSource>
          <PrimaryNeedCode>N1</PrimaryNeedCode>
          <Assessments>
            <AssessmentActualStartDate>2020-01-05</AssessmentActualStartDate>
            <AssessmentAuthorisationDate>2020-01-20</AssessmentAuthorisationDate>
            <FactorsIdentifiedAtAssessment><AssessmentFactors>1A</AssessmentFactors><AssessmentFactors>20</AssessmentFactors></FactorsIdentifiedAtAssessment>
          </Assessments>
          <ChildProtectionPlans>
            <CPPstartDate>2020-02-01</CPPstartDate>
            <Reviews><CPPreviewDate>2020-03-01</CPPreviewDate><CPPreviewDate>2020-06-01</CPPreviewDate></Reviews>
          </ChildProtectionPlans>
        </CINdetails>
      </Child>"#;

    fn tree(children: &str) -> RecordTree {
        parse_str("la.xml", &format!("<Message><Children>{}</Children></Message>", children)).unwrap()
    }

    fn rows_of<'t>(table: &'t RecordTable, kind: &str) -> Vec<&'t Row> {
        table
            .rows
            .iter()
            .filter(|r| r.get(TYPE_COLUMN).map(String::as_str) == Some(kind))
            .collect()
    }

    #[test]
    fn test_one_row_per_configured_event() {
        let table = build_record_table(&[tree(CHILD_A)], &FlattenConfig::default()).unwrap().table;
        let types: Vec<_> = table.rows.iter().filter_map(|r| r.get(TYPE_COLUMN)).collect();
        assert_eq!(
            types,
            vec![
                "CINreferralDate",
                "AssessmentActualStartDate",
                "AssessmentAuthorisationDate",
                "CPPstartDate"
            ]
        );
        assert_eq!(&table.columns[..3], &["LAchildID", "Date", "Type"]);
    }

    #[test]
    fn test_rows_carry_siblings_lists_and_child_fields() {
        let table = build_record_table(&[tree(CHILD_A)], &FlattenConfig::default()).unwrap().table;

        let referral = rows_of(&table, "CINreferralDate")[0];
        assert_eq!(referral["Date"], "2020-01-01");
        assert_eq!(referral["PrimaryNeedCode"], "N1");
        assert_eq!(referral["LAchildID"], "A1");
        assert_eq!(referral["Ethnicity"], "WBRI");
        assert_eq!(referral["Disabilities"], "MOB,VIS");
        assert!(!referral.contains_key("Factors"));

        let assessment = rows_of(&table, "AssessmentActualStartDate")[0];
        assert_eq!(assessment["Factors"], "1A,20");
        assert_eq!(assessment["AssessmentAuthorisationDate"], "2020-01-20");

        let plan = rows_of(&table, "CPPstartDate")[0];
        assert_eq!(plan["CPPreview"], "2020-03-01,2020-06-01");
        assert_eq!(plan["GenderCurrent"], "1");
    }

    #[test]
    fn test_referral_source_is_forward_filled_within_a_child() {
        let table = build_record_table(&[tree(CHILD_A)], &FlattenConfig::default()).unwrap().table;
        assert!(table.rows.iter().all(|r| r.get("ReferralSource").map(String::as_str) == Some("1A")));
    }

    #[test]
    fn test_referral_source_does_not_leak_across_children() {
        let other = r#"
          <Child>
            <ChildIdentifiers><LAchildID>B2</LAchildID></ChildIdentifiers>
            <ChildCharacteristics/>
            <CINdetails><CINreferralDate>2021-05-05</CINreferralDate></CINdetails>
          </Child>"#;
        let trees = [tree(&format!("{}{}", CHILD_A, other))];
        let table = build_record_table(&trees, &FlattenConfig::default()).unwrap().table;
        let row = rows_of(&table, "CINreferralDate")
            .into_iter()
            .find(|r| r["LAchildID"] == "B2")
            .unwrap();
        assert!(!row.contains_key("ReferralSource"));
    }

    #[test]
    fn test_child_missing_a_group_contributes_no_rows() {
        let partial = r#"
          <Child>
            <ChildIdentifiers><LAchildID>C3</LAchildID></ChildIdentifiers>
            <CINdetails><CINreferralDate>2021-05-05</CINreferralDate></CINdetails>
          </Child>"#;
        let table = build_record_table(&[tree(partial)], &FlattenConfig::default()).unwrap().table;
        assert!(table.is_empty());
    }

    #[test]
    fn test_child_without_events_contributes_no_rows() {
        let quiet = r#"
          <Child>
            <ChildIdentifiers><LAchildID>D4</LAchildID></ChildIdentifiers>
            <ChildCharacteristics><Ethnicity>WBRI</Ethnicity></ChildCharacteristics>
            <CINdetails><ReferralSource>1A</ReferralSource></CINdetails>
          </Child>"#;
        let table = build_record_table(&[tree(quiet)], &FlattenConfig::default()).unwrap().table;
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_event_across_files_keeps_most_complete() {
        let sparse = r#"
          <Child>
            <ChildIdentifiers><LAchildID>A1</LAchildID></ChildIdentifiers>
            <ChildCharacteristics/>
            <CINdetails><CINreferralDate>2020-01-01</CINreferralDate></CINdetails>
          </Child>"#;
        let trees = [tree(sparse), tree(CHILD_A)];

        let raw = collect_rows(&trees, &FlattenConfig::default()).unwrap();
        assert_eq!(raw.len(), 5);

        let flat = build_record_table(&trees, &FlattenConfig::default()).unwrap();
        assert_eq!(flat.rows_before_dedup, 5);
        assert_eq!(flat.duplicates_dropped(), 1);
        let table = flat.table;
        let referrals = rows_of(&table, "CINreferralDate");
        assert_eq!(referrals.len(), 1);
        assert_eq!(referrals[0]["Ethnicity"], "WBRI");
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_custom_event_list() {
        let config = FlattenConfig {
            events: vec!["CPPstartDate".to_string()],
        };
        let table = build_record_table(&[tree(CHILD_A)], &config).unwrap().table;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0]["Type"], "CPPstartDate");
    }

    #[test]
    fn test_tree_without_children_collection_is_an_error() {
        let broken = parse_str("la.xml", "<Message/>").unwrap();
        let err = build_record_table(&[broken], &FlattenConfig::default()).unwrap_err();
        assert!(matches!(err, CinError::MissingElement { .. }));
    }
}
