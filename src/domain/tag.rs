use std::fmt;

/// Declares the closed set of CIN Census element names, resolved once from
/// a namespace-free local name.
macro_rules! cin_tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Element names the degrader, cleaner and flattener dispatch on
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant,)+
            /// Any element outside the CIN Census vocabulary
            Other(String),
        }

        impl Tag {
            /// Every known element name, in declaration order
            pub const ALL: &'static [Tag] = &[$(Tag::$variant),+];

            pub fn from_local_name(name: &str) -> Self {
                match name {
                    $($name => Tag::$variant,)+
                    other => Tag::Other(other.to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Tag::$variant => $name,)+
                    Tag::Other(name) => name.as_str(),
                }
            }
        }
    };
}

cin_tags! {
    // Collections and groups
    Children => "Children",
    Child => "Child",
    ChildIdentifiers => "ChildIdentifiers",
    ChildCharacteristics => "ChildCharacteristics",
    CinDetails => "CINdetails",
    Disabilities => "Disabilities",
    Assessments => "Assessments",
    FactorsIdentifiedAtAssessment => "FactorsIdentifiedAtAssessment",
    Section47 => "Section47",
    ChildProtectionPlans => "ChildProtectionPlans",
    Reviews => "Reviews",

    // ChildIdentifiers
    LaChildId => "LAchildID",
    Upn => "UPN",
    FormerUpn => "FormerUPN",
    UpnUnknown => "UPNunknown",
    PersonBirthDate => "PersonBirthDate",
    PersonSchoolYear => "PersonSchoolYear",
    ExpectedPersonBirthDate => "ExpectedPersonBirthDate",
    GenderCurrent => "GenderCurrent",
    PersonDeathDate => "PersonDeathDate",

    // ChildCharacteristics
    Ethnicity => "Ethnicity",
    Disability => "Disability",

    // CINdetails
    CinReferralDate => "CINreferralDate",
    ReferralSource => "ReferralSource",
    PrimaryNeedCode => "PrimaryNeedCode",
    CinClosureDate => "CINclosureDate",
    ReasonForClosure => "ReasonForClosure",
    ReferralNfa => "ReferralNFA",
    DateOfInitialCpc => "DateOfInitialCPC",

    // Assessments
    AssessmentActualStartDate => "AssessmentActualStartDate",
    AssessmentInternalReviewDate => "AssessmentInternalReviewDate",
    AssessmentAuthorisationDate => "AssessmentAuthorisationDate",
    AssessmentFactors => "AssessmentFactors",

    // Section47
    S47ActualStartDate => "S47ActualStartDate",
    InitialCpcTarget => "InitialCPCtarget",
    IcpcNotRequired => "ICPCnotRequired",

    // ChildProtectionPlans
    CppStartDate => "CPPstartDate",
    InitialCategoryOfAbuse => "InitialCategoryOfAbuse",
    LatestCategoryOfAbuse => "LatestCategoryOfAbuse",
    NumberOfPreviousCpp => "NumberOfPreviousCPP",
    CppEndDate => "CPPendDate",
    CppReviewDate => "CPPreviewDate",
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::from_local_name(name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
