// src/models/result.rs

//! Decoded result records and report header data.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::models::{JurisdictionId, Level};

/// Channel through which votes were cast.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteType {
    ElectionDay,
    Absentee,
    Early,
    Provisional,
    /// Any vendor label without a known channel, e.g. "Undervotes".
    Other(String),
}

impl VoteType {
    /// Map a vendor label onto a channel, ignoring case.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_lowercase().as_str() {
            "election day" | "election day votes" | "election" => VoteType::ElectionDay,
            "absentee" | "absentee votes" | "absentee by mail" | "mail" | "vote by mail" => {
                VoteType::Absentee
            }
            "early" | "early voting" | "early vote" | "advance voting" => VoteType::Early,
            "provisional" | "provisional votes" => VoteType::Provisional,
            _ => VoteType::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VoteType::ElectionDay => "Election Day",
            VoteType::Absentee => "Absentee",
            VoteType::Early => "Early Voting",
            VoteType::Provisional => "Provisional",
            VoteType::Other(label) => label,
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VoteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// County or precinct row inside a report that a count belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportingUnit {
    pub level: Level,
    pub name: String,
}

/// One vote count from a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    /// Office or ballot question text
    pub contest: String,

    /// Candidate or option; `None` on contest-level summary rows
    pub choice: Option<String>,

    pub party: Option<String>,

    pub votes: u64,

    pub vote_type: Option<VoteType>,

    /// Breakdown row within the report, if the count is not an aggregate
    pub reporting_unit: Option<ReportingUnit>,

    /// Owning jurisdiction, set once the record leaves the decoder
    #[serde(skip)]
    pub jurisdiction: Option<JurisdictionId>,
}

impl ResultRecord {
    /// Tag the record with the jurisdiction whose report produced it.
    pub fn with_jurisdiction(mut self, id: JurisdictionId) -> Self {
        self.jurisdiction = Some(id);
        self
    }
}

/// Registered voters and ballots cast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Turnout {
    pub total_voters: Option<u64>,
    pub ballots_cast: Option<u64>,
}

/// Header fields of a report, read before its first contest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElectionInfo {
    pub name: Option<String>,

    /// Raw election date text, e.g. "11/4/2014"
    pub date_text: Option<String>,

    /// Raw vendor timestamp, e.g. "11/13/2014 4:19:58 PM EST"
    pub timestamp: Option<String>,

    pub region: Option<String>,

    pub turnout: Turnout,

    /// Per-county or per-precinct turnout, in document order
    pub unit_turnout: Vec<(ReportingUnit, Turnout)>,
}

impl ElectionInfo {
    /// Election date, when the vendor used `month/day/year`.
    pub fn date(&self) -> Option<NaiveDate> {
        let text = self.date_text.as_deref()?.trim();
        NaiveDate::parse_from_str(text, "%m/%d/%Y").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_type_from_label() {
        assert_eq!(VoteType::from_label("Election Day"), VoteType::ElectionDay);
        assert_eq!(VoteType::from_label("ABSENTEE"), VoteType::Absentee);
        assert_eq!(VoteType::from_label(" Early Voting "), VoteType::Early);
        assert_eq!(VoteType::from_label("Provisional"), VoteType::Provisional);
        assert_eq!(
            VoteType::from_label("Undervotes"),
            VoteType::Other("Undervotes".to_string())
        );
    }

    #[test]
    fn test_vote_type_serializes_as_label() {
        let json = serde_json::to_string(&VoteType::Other("Overvotes".to_string())).unwrap();
        assert_eq!(json, "\"Overvotes\"");
        let json = serde_json::to_string(&VoteType::Absentee).unwrap();
        assert_eq!(json, "\"Absentee\"");
    }

    #[test]
    fn test_election_date() {
        let info = ElectionInfo {
            date_text: Some("11/4/2014".to_string()),
            ..ElectionInfo::default()
        };
        assert_eq!(info.date(), NaiveDate::from_ymd_opt(2014, 11, 4));

        let info = ElectionInfo {
            date_text: Some("Tuesday".to_string()),
            ..ElectionInfo::default()
        };
        assert_eq!(info.date(), None);
    }
}
