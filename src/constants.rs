//! Column and marker names shared by the cleaner, the flattener and the
//! regional concat.

// Leading columns of the flat table
pub const CHILD_ID_COLUMN: &str = "LAchildID";
pub const DATE_COLUMN: &str = "Date";
pub const TYPE_COLUMN: &str = "Type";

// Derived list columns
pub const FACTORS_COLUMN: &str = "Factors";
pub const CPP_REVIEW_COLUMN: &str = "CPPreview";

/// Forward-filled within each child's block of rows
pub const REFERRAL_SOURCE_COLUMN: &str = "ReferralSource";

/// Prefix of the in-band replacement for values that fail validation
pub const INVALID_PREFIX: &str = "Not in proper format: ";

/// Name of the merged table written by the regional concat
pub const MASTER_TABLE_FILE: &str = "main_flatcin.csv";

/// Length of the region code prefixed onto child ids by the regional concat
pub const REGION_CODE_LEN: usize = 3;

/// Event tags extracted by default, one row per occurrence
pub const DEFAULT_EVENT_TAGS: [&str; 8] = [
    "CINreferralDate",
    "CINclosureDate",
    "DateOfInitialCPC",
    "AssessmentActualStartDate",
    "AssessmentAuthorisationDate",
    "S47ActualStartDate",
    "CPPstartDate",
    "CPPendDate",
];

/// Wrap a value that failed validation, keeping the original text for audit
pub fn invalid_value(raw: &str) -> String {
    format!("{}{}", INVALID_PREFIX, raw)
}

/// Whether a value has already been replaced by the invalid marker
pub fn is_invalid_value(value: &str) -> bool {
    value.starts_with(INVALID_PREFIX)
}
