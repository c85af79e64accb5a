// src/models/jurisdiction.rs

//! Jurisdiction nodes and the reporting level hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::url::ClarityPath;

/// Administrative reporting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    State,
    County,
    Precinct,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::State => "state",
            Level::County => "county",
            Level::Precinct => "precinct",
        }
    }

    /// The level one step below, if any.
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::State => Some(Level::County),
            Level::County => Some(Level::Precinct),
            Level::Precinct => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "state" => Ok(Level::State),
            "county" => Ok(Level::County),
            "precinct" => Ok(Level::Precinct),
            other => Err(AppError::validation(format!("unknown level '{other}'"))),
        }
    }
}

/// Report archive format published for every jurisdiction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Xml,
    Xls,
    Txt,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xml => "xml",
            ReportFormat::Xls => "xls",
            ReportFormat::Txt => "txt",
        }
    }
}

/// A level paired with the name the URL gives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelName {
    pub level: Level,
    pub name: String,
}

impl LevelName {
    pub fn new(level: Level, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
        }
    }
}

/// Classify a results-page URL into the levels it represents.
///
/// Returns `[state?, county?]` in that order; never a precinct.
pub fn infer_levels(url: &str) -> Result<Vec<LevelName>> {
    Ok(ClarityPath::parse(url)?.levels())
}

/// A state, county or precinct with its own Clarity results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jurisdiction {
    path: ClarityPath,
    level: Level,
    name: String,
}

impl Jurisdiction {
    /// Create a jurisdiction from its results-page URL.
    pub fn new(url: &str, level: Level, name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            path: ClarityPath::parse(url)?,
            level,
            name: name.into(),
        })
    }

    pub fn url(&self) -> &str {
        self.path.as_str()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Two-letter state code from the URL path.
    pub fn state_code(&self) -> &str {
        self.path.state_code()
    }

    /// Detail report archive URL.
    pub fn report_url(&self, format: ReportFormat) -> String {
        self.path.report_url(format)
    }

    /// Summary report archive URL.
    pub fn summary_url(&self) -> String {
        self.path.summary_url()
    }

    /// Page listing child jurisdictions; only states have one.
    pub fn subjurisdiction_listing_url(&self) -> Option<String> {
        (self.level == Level::State).then(|| self.path.listing_url())
    }

    pub(crate) fn path(&self) -> &ClarityPath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_levels_state_and_county() {
        let levels = infer_levels(
            "http://results.enr.clarityelections.com/AR/Benton/63917/183978/Web01/en/summary.html",
        )
        .unwrap();
        assert_eq!(
            levels,
            vec![
                LevelName::new(Level::State, "AR"),
                LevelName::new(Level::County, "Benton"),
            ]
        );
    }

    #[test]
    fn test_infer_levels_state_only() {
        let levels = infer_levels(
            "http://results.enr.clarityelections.com/AR/63912/184685/Web01/en/summary.html",
        )
        .unwrap();
        assert_eq!(levels, vec![LevelName::new(Level::State, "AR")]);
    }

    #[test]
    fn test_infer_levels_never_precinct() {
        let urls = [
            "http://host/AR/63912",
            "http://host/AR/Benton",
            "http://host/ar/Benton/1/en/summary.html",
            "http://host/Benton/63917/183978/en/summary.html",
        ];
        for url in urls {
            let levels = infer_levels(url).unwrap();
            assert!(levels.iter().all(|l| l.level != Level::Precinct));
            assert!(levels.windows(2).all(|w| w[0].level < w[1].level));
        }
    }

    #[test]
    fn test_infer_levels_lowercase_state_is_county_only() {
        let levels = infer_levels("http://host/ar/Benton/1/en/summary.html").unwrap();
        assert_eq!(levels, vec![LevelName::new(Level::County, "Benton")]);
    }

    #[test]
    fn test_infer_levels_malformed() {
        assert!(matches!(
            infer_levels("http://host/summary.html"),
            Err(AppError::MalformedUrl { .. })
        ));
    }

    #[test]
    fn test_listing_url_only_for_states() {
        let url = "http://host/AR/63912/184685/Web01/en/summary.html";
        let state = Jurisdiction::new(url, Level::State, "AR").unwrap();
        let county = Jurisdiction::new(url, Level::County, "Arkansas").unwrap();

        assert_eq!(
            state.subjurisdiction_listing_url().as_deref(),
            Some("http://host/AR/63912/184685/Web01/en/select-county.html")
        );
        assert_eq!(county.subjurisdiction_listing_url(), None);
        assert_eq!(state.state_code(), "AR");
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("State".parse::<Level>().unwrap(), Level::State);
        assert_eq!(" county ".parse::<Level>().unwrap(), Level::County);
        assert!("city".parse::<Level>().is_err());
    }
}
