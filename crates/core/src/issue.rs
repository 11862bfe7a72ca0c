//! Issue status and category enums plus create-time validation.
//!
//! Both enums are stored as `TEXT` columns holding the SCREAMING_SNAKE_CASE
//! wire value, so the same string is used in JSON, SQL and spreadsheets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// The stored / wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{}'. Must be one of: {:?}",
                        $label,
                        other,
                        [$($text),+]
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

define_text_enum! {
    /// Lifecycle status of an issue.
    IssueStatus, "status" {
        Open = "OPEN",
        Solved = "SOLVED",
    }
}

define_text_enum! {
    /// Category of a reported issue.
    IssueType, "issue type" {
        Electrical = "ELECTRICAL",
        Plumbing = "PLUMBING",
        Hvac = "HVAC",
        Structural = "STRUCTURAL",
        Cleaning = "CLEANING",
        Security = "SECURITY",
        It = "IT",
        Other = "OTHER",
    }
}

/// Fields required to create an issue, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssueFields {
    pub issue_number: String,
    pub location: String,
    pub issue_type: IssueType,
}

/// Validate the required create fields in order: issue number, location,
/// issue type. The first missing one is reported.
pub fn validate_new_issue(
    issue_number: Option<&str>,
    location: Option<&str>,
    issue_type: Option<&str>,
) -> Result<NewIssueFields, CoreError> {
    let issue_number = require(issue_number, "Issue number is required")?;
    let location = require(location, "Location is required")?;
    let issue_type = require(issue_type, "Issue type is required")?.parse()?;

    Ok(NewIssueFields {
        issue_number,
        location,
        issue_type,
    })
}

/// Validate a replacement location on update. Absent is fine; blank is not.
pub fn validate_location(location: &str) -> Result<(), CoreError> {
    if location.trim().is_empty() {
        return Err(CoreError::Validation("Location cannot be empty".into()));
    }
    Ok(())
}

fn require(value: Option<&str>, message: &str) -> Result<String, CoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Validation(message.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_round_trips_through_its_text_form() {
        for status in [IssueStatus::Open, IssueStatus::Solved] {
            assert_eq!(status.as_str().parse::<IssueStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!("CLOSED".parse::<IssueStatus>(), Err(CoreError::Validation(_)));
        assert_matches!("open".parse::<IssueStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn issue_type_serializes_as_screaming_case() {
        let json = serde_json::to_string(&IssueType::Hvac).unwrap();
        assert_eq!(json, "\"HVAC\"");
        let back: IssueType = serde_json::from_str("\"PLUMBING\"").unwrap();
        assert_eq!(back, IssueType::Plumbing);
    }

    #[test]
    fn missing_issue_number_is_reported_first() {
        let err = validate_new_issue(None, None, None).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Issue number is required");
    }

    #[test]
    fn blank_location_counts_as_missing() {
        let err = validate_new_issue(Some("A-12"), Some("   "), Some("OTHER")).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Location is required");
    }

    #[test]
    fn missing_issue_type_is_reported() {
        let err = validate_new_issue(Some("A-12"), Some("Lobby"), Some("")).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "Issue type is required");
    }

    #[test]
    fn unknown_issue_type_is_rejected() {
        let err = validate_new_issue(Some("A-12"), Some("Lobby"), Some("GARDEN")).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("GARDEN"));
    }

    #[test]
    fn valid_fields_are_trimmed() {
        let fields = validate_new_issue(Some(" A-12 "), Some("Lobby"), Some("IT")).unwrap();
        assert_eq!(
            fields,
            NewIssueFields {
                issue_number: "A-12".into(),
                location: "Lobby".into(),
                issue_type: IssueType::It,
            }
        );
    }

    #[test]
    fn blank_location_update_is_rejected() {
        assert!(validate_location("").is_err());
        assert!(validate_location("Roof").is_ok());
    }
}
