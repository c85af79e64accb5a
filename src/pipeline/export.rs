// src/pipeline/export.rs

//! Tabular output of results and jurisdictions.

use std::io::Write;

use futures::StreamExt;
use serde::Serialize;

use crate::error::Result;
use crate::models::{
    JurisdictionTree, Level, LevelName, OutputConfig, OutputFormat, ReportFormat, ResultRecord,
};
use crate::pipeline::ResultStream;

const LEVELS: [Level; 3] = [Level::State, Level::County, Level::Precinct];

/// Jurisdiction columns of a results table.
///
/// A level gets a column when the URL names it, when it is the level just
/// below the URL's deepest one, or, for counties and precincts, when the run
/// crawled subjurisdictions.
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    named: Vec<LevelName>,
    levels: Vec<Level>,
    vote_type: bool,
}

impl ColumnPlan {
    pub fn new(named: &[LevelName], expand: bool, config: &OutputConfig) -> Self {
        let below = named.last().and_then(|l| l.level.child());

        let levels = LEVELS
            .into_iter()
            .filter(|&level| {
                let wanted = named.iter().any(|l| l.level == level)
                    || Some(level) == below
                    || (expand && level != Level::State);
                wanted && (level != Level::State || config.state_column)
            })
            .collect();

        Self {
            named: named.to_vec(),
            levels,
            vote_type: config.vote_type_column,
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["office", "candidate", "party"];
        header.extend(self.levels.iter().map(Level::as_str));
        header.push("votes");
        if self.vote_type {
            header.push("vote_type");
        }
        header
    }

    pub fn row(&self, record: &ResultRecord, tree: &JurisdictionTree) -> Vec<String> {
        let mut row = vec![
            record.contest.clone(),
            record.choice.clone().unwrap_or_default(),
            record.party.clone().unwrap_or_default(),
        ];
        row.extend(self.levels.iter().map(|&level| self.level_value(level, record, tree)));
        row.push(record.votes.to_string());
        if self.vote_type {
            row.push(
                record
                    .vote_type
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            );
        }
        row
    }

    /// URL name first, then the owning jurisdiction, then the report row.
    fn level_value(&self, level: Level, record: &ResultRecord, tree: &JurisdictionTree) -> String {
        if let Some(named) = self.named.iter().find(|l| l.level == level) {
            return named.name.clone();
        }

        let owner = record
            .jurisdiction
            .and_then(|id| tree.get(id))
            .filter(|j| j.level() == level);
        if let Some(jurisdiction) = owner {
            return jurisdiction.name().to_string();
        }

        record
            .reporting_unit
            .as_ref()
            .filter(|unit| unit.level == level)
            .map(|unit| unit.name.clone())
            .unwrap_or_default()
    }
}

/// Counts from a results export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub records: usize,
    pub failures: usize,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    record: &'a ResultRecord,
    jurisdiction: Option<&'a str>,
}

/// Write every record of a stream to `out`.
///
/// Per-jurisdiction failures are logged and counted; a fatal error stops the
/// export and is returned.
pub async fn run_results<W: Write>(
    mut stream: ResultStream,
    expand: bool,
    config: &OutputConfig,
    out: W,
) -> Result<ExportSummary> {
    let tree = stream.tree().clone();
    let plan = ColumnPlan::new(stream.levels(), expand, config);
    let mut summary = ExportSummary::default();

    let mut csv_writer = None;
    let mut json_out = None;
    match config.format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(plan.header())?;
            csv_writer = Some(writer);
        }
        OutputFormat::Json => json_out = Some(out),
    }

    while let Some(item) = stream.next().await {
        let record = match item {
            Ok(record) => record,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Skipping jurisdiction: {}", e);
                summary.failures += 1;
                continue;
            }
        };

        if let Some(writer) = csv_writer.as_mut() {
            writer.write_record(plan.row(&record, &tree))?;
        }
        if let Some(out) = json_out.as_mut() {
            let row = JsonRecord {
                record: &record,
                jurisdiction: record.jurisdiction.and_then(|id| tree.get(id)).map(|j| j.url()),
            };
            serde_json::to_writer(&mut *out, &row)?;
            writeln!(out)?;
        }
        summary.records += 1;
    }

    if let Some(mut writer) = csv_writer {
        writer.flush()?;
    }
    if let Some(mut out) = json_out {
        out.flush()?;
    }

    log::info!(
        "Exported {} records ({} jurisdictions failed)",
        summary.records,
        summary.failures
    );
    Ok(summary)
}

#[derive(Serialize)]
struct JurisdictionRow<'a> {
    name: &'a str,
    level: Level,
    url: &'a str,
    parent: Option<&'a str>,
    report_url: String,
}

/// Write a jurisdiction tree in pre-order.
pub fn run_jurisdictions<W: Write>(
    tree: &JurisdictionTree,
    format: OutputFormat,
    mut out: W,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["name", "level", "url"])?;
            for (_, jurisdiction) in tree.iter() {
                writer.write_record([
                    jurisdiction.name(),
                    jurisdiction.level().as_str(),
                    jurisdiction.url(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let rows: Vec<JurisdictionRow> = tree
                .iter()
                .map(|(id, jurisdiction)| JurisdictionRow {
                    name: jurisdiction.name(),
                    level: jurisdiction.level(),
                    url: jurisdiction.url(),
                    parent: tree.parent(id).map(|parent| tree[parent].url()),
                    report_url: jurisdiction.report_url(ReportFormat::Xml),
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{Jurisdiction, ReportingUnit};
    use crate::pipeline::Ingestor;
    use crate::storage::archive::testing::zip_of;
    use crate::utils::http::testing::StaticFetcher;

    const STATE_URL: &str = "http://host/AR/63912/184685/Web01/en/summary.html";
    const COUNTY_URL: &str = "http://host/AR/Benton/63917/183978/Web01/en/summary.html";

    fn state_only() -> Vec<LevelName> {
        vec![LevelName::new(Level::State, "AR")]
    }

    fn record(unit: Option<(Level, &str)>) -> ResultRecord {
        ResultRecord {
            contest: "President".to_string(),
            choice: Some("A".to_string()),
            party: Some("DEM".to_string()),
            votes: 10,
            vote_type: None,
            reporting_unit: unit.map(|(level, name)| ReportingUnit {
                level,
                name: name.to_string(),
            }),
            jurisdiction: None,
        }
    }

    #[test]
    fn test_columns_for_state_url() {
        let plan = ColumnPlan::new(&state_only(), false, &OutputConfig::default());
        assert_eq!(plan.levels(), &[Level::State, Level::County]);
        assert_eq!(
            plan.header(),
            vec!["office", "candidate", "party", "state", "county", "votes", "vote_type"]
        );

        let plan = ColumnPlan::new(&state_only(), true, &OutputConfig::default());
        assert_eq!(plan.levels(), &[Level::State, Level::County, Level::Precinct]);
    }

    #[test]
    fn test_columns_follow_output_config() {
        let config = OutputConfig {
            state_column: false,
            vote_type_column: false,
            ..OutputConfig::default()
        };
        let named = vec![
            LevelName::new(Level::State, "AR"),
            LevelName::new(Level::County, "Benton"),
        ];
        let plan = ColumnPlan::new(&named, false, &config);
        assert_eq!(plan.levels(), &[Level::County, Level::Precinct]);
        assert_eq!(
            plan.header(),
            vec!["office", "candidate", "party", "county", "precinct", "votes"]
        );
    }

    #[test]
    fn test_row_values() {
        let tree = JurisdictionTree::new(Jurisdiction::new(STATE_URL, Level::State, "AR").unwrap());
        let plan = ColumnPlan::new(&state_only(), false, &OutputConfig::default());

        assert_eq!(
            plan.row(&record(Some((Level::County, "Benton"))), &tree),
            vec!["President", "A", "DEM", "AR", "Benton", "10", ""]
        );
        assert_eq!(
            plan.row(&record(Some((Level::Precinct, "P1"))), &tree),
            vec!["President", "A", "DEM", "AR", "", "10", ""]
        );
    }

    #[tokio::test]
    async fn test_run_results_csv() {
        let xml = r#"<ElectionResult><Contest text="President">
            <Choice text="A" party="DEM" totalVotes="10"/>
            <Choice text="B" totalVotes="7"/>
        </Contest></ElectionResult>"#;
        let fetcher = StaticFetcher::new().with(
            "http://host/AR/Benton/63917/183978/Web01/reports/detailxml.zip",
            zip_of(&[("detail.xml", xml)]),
        );
        let ingestor = Ingestor::new(Arc::new(fetcher));
        let stream = ingestor.stream_results(COUNTY_URL, false).await.unwrap();

        let mut out = Vec::new();
        let summary = run_results(stream, false, &OutputConfig::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(summary, ExportSummary { records: 2, failures: 0 });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "office,candidate,party,state,county,precinct,votes,vote_type\n\
             President,A,DEM,AR,Benton,,10,\n\
             President,B,,AR,Benton,,7,\n"
        );
    }

    #[tokio::test]
    async fn test_run_results_counts_failures() {
        let ingestor = Ingestor::new(Arc::new(StaticFetcher::new()));
        let stream = ingestor.stream_results(COUNTY_URL, false).await.unwrap();

        let mut out = Vec::new();
        let summary = run_results(stream, false, &OutputConfig::default(), &mut out)
            .await
            .unwrap();
        assert_eq!(summary, ExportSummary { records: 0, failures: 1 });
    }

    #[test]
    fn test_run_jurisdictions() {
        let tree = JurisdictionTree::new(Jurisdiction::new(STATE_URL, Level::State, "AR").unwrap());

        let mut out = Vec::new();
        run_jurisdictions(&tree, OutputFormat::Csv, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("name,level,url\nAR,state,{STATE_URL}\n")
        );

        let mut out = Vec::new();
        run_jurisdictions(&tree, OutputFormat::Json, &mut out).unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows[0]["level"], "state");
        assert_eq!(rows[0]["parent"], serde_json::Value::Null);
        assert_eq!(
            rows[0]["report_url"],
            "http://host/AR/63912/184685/Web01/reports/detailxml.zip"
        );
    }
}
