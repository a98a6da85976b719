use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::DEFAULT_EVENT_TAGS;
use crate::error::{CinError, Result};

/// Field rules shipped with the crate
const BUILTIN_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub flatten: FlattenConfig,
    pub fields: FieldRules,
}

/// Which event tags become rows of the flat table
#[derive(Debug, Clone, Deserialize)]
pub struct FlattenConfig {
    #[serde(default = "default_events")]
    pub events: Vec<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            events: default_events(),
        }
    }
}

fn default_events() -> Vec<String> {
    DEFAULT_EVENT_TAGS.iter().map(|t| t.to_string()).collect()
}

/// How a single field is validated
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Value must parse with this chrono pattern
    Date(String),
    /// Value must resolve against this code table
    Category(Vec<CategoryCode>),
    /// Value must parse as an integer
    Integer(bool),
    /// Value is only trimmed
    Text(bool),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryCode {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CategoryCode {
    pub fn new(code: &str, name: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            name: name.map(str::to_string),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    })
}

/// A rule for a field, or a nested group of further entries
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Rule(FieldRule),
    Group(BTreeMap<String, RuleEntry>),
}

/// Nested group -> (sub-group ->)* field -> rule mapping
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldRules {
    groups: BTreeMap<String, RuleEntry>,
}

impl FieldRules {
    /// Rule at `path`, e.g. `["CINdetails", "Assessments", "AssessmentActualStartDate"]`
    pub fn lookup(&self, path: &[&str]) -> Option<&FieldRule> {
        let (first, rest) = path.split_first()?;
        let mut entry = self.groups.get(*first)?;
        for segment in rest {
            match entry {
                RuleEntry::Group(map) => entry = map.get(*segment)?,
                RuleEntry::Rule(_) => return None,
            }
        }
        match entry {
            RuleEntry::Rule(rule) => Some(rule),
            RuleEntry::Group(_) => None,
        }
    }

    /// Date pattern configured at `path`
    pub fn date_pattern(&self, path: &[&str]) -> Result<&str> {
        match self.lookup(path) {
            Some(FieldRule::Date(pattern)) => Ok(pattern.as_str()),
            Some(other) => Err(CinError::Config(format!(
                "{} expects a date rule, found {:?}",
                path.join("/"),
                other
            ))),
            None => Err(CinError::Config(format!("no date rule configured for {}", path.join("/")))),
        }
    }

    /// Code table configured at `path`
    pub fn categories(&self, path: &[&str]) -> Result<&[CategoryCode]> {
        match self.lookup(path) {
            Some(FieldRule::Category(codes)) => Ok(codes.as_slice()),
            Some(other) => Err(CinError::Config(format!(
                "{} expects a category rule, found {:?}",
                path.join("/"),
                other
            ))),
            None => Err(CinError::Config(format!(
                "no category rule configured for {}",
                path.join("/")
            ))),
        }
    }

    /// Insert or replace a rule, creating intermediate groups
    pub fn insert(&mut self, path: &[&str], rule: FieldRule) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut map = &mut self.groups;
        for segment in parents {
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| RuleEntry::Group(BTreeMap::new()));
            if let RuleEntry::Rule(_) = entry {
                *entry = RuleEntry::Group(BTreeMap::new());
            }
            map = match entry {
                RuleEntry::Group(inner) => inner,
                RuleEntry::Rule(_) => unreachable!("replaced by a group above"),
            };
        }
        map.insert(last.to_string(), RuleEntry::Rule(rule));
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CinError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// The configuration shipped in `config.toml`
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// Load from `path` when given, falling back to the shipped rules
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [flatten]
        events = ["CINreferralDate"]

        [fields.ChildIdentifiers.GenderCurrent]
        category = [{ code = 1, name = "Male" }, { code = "2", name = "Female" }]

        [fields.CINdetails.Assessments.AssessmentActualStartDate]
        date = "%Y-%m-%d"

        [fields.CINdetails.ChildProtectionPlans.NumberOfPreviousCPP]
        integer = true
    "#;

    #[test]
    fn test_nested_rules_are_looked_up_by_path() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.flatten.events, vec!["CINreferralDate".to_string()]);

        let pattern = config
            .fields
            .date_pattern(&["CINdetails", "Assessments", "AssessmentActualStartDate"])
            .unwrap();
        assert_eq!(pattern, "%Y-%m-%d");

        assert_eq!(
            config.fields.lookup(&["CINdetails", "ChildProtectionPlans", "NumberOfPreviousCPP"]),
            Some(&FieldRule::Integer(true))
        );
        assert!(config.fields.lookup(&["CINdetails", "Assessments"]).is_none());
    }

    #[test]
    fn test_numeric_codes_are_read_as_strings() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let codes = config.fields.categories(&["ChildIdentifiers", "GenderCurrent"]).unwrap();
        assert_eq!(codes[0], CategoryCode::new("1", Some("Male")));
        assert_eq!(codes[1].code, "2");
    }

    #[test]
    fn test_wrong_rule_shape_is_a_config_error() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let err = config
            .fields
            .categories(&["CINdetails", "Assessments", "AssessmentActualStartDate"])
            .unwrap_err();
        assert!(matches!(err, CinError::Config(_)));
        assert!(config.fields.date_pattern(&["CINdetails", "Nope"]).is_err());
    }

    #[test]
    fn test_missing_flatten_section_uses_default_events() {
        let config = AppConfig::from_toml_str("[fields]\n").unwrap();
        assert_eq!(config.flatten.events.len(), DEFAULT_EVENT_TAGS.len());
        assert_eq!(config.flatten.events[0], "CINreferralDate");
    }

    #[test]
    fn test_insert_creates_intermediate_groups() {
        let mut rules = FieldRules::default();
        rules.insert(&["CINdetails", "Section47", "S47ActualStartDate"], FieldRule::Date("%d/%m/%Y".into()));
        assert_eq!(
            rules.date_pattern(&["CINdetails", "Section47", "S47ActualStartDate"]).unwrap(),
            "%d/%m/%Y"
        );
    }

    #[test]
    fn test_builtin_config_parses() {
        let config = AppConfig::builtin().unwrap();
        assert!(config
            .fields
            .categories(&["ChildCharacteristics", "Disabilities", "Disability"])
            .is_ok());
    }
}
