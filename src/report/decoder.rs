// src/report/decoder.rs

//! Streaming decoder for Clarity `detail.xml` reports.

use std::fmt;
use std::io::{Cursor, Read};
use std::iter::FusedIterator;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::{AppError, Result};
use crate::models::{ElectionInfo, ReportingUnit, ResultRecord, Turnout};
use crate::report::rows::{self, ChoiceChild, ChoiceFrame, Row, VoteTypeFrame};
use crate::report::schema::{ROOT, Schema};

/// Open element, labelled for error paths.
#[derive(Debug)]
struct Element {
    name: String,
    label: Option<String>,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}[{}]", self.name, label),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum HeaderField {
    Name,
    Date,
    Timestamp,
    Region,
}

enum Step {
    Emit(ResultRecord),
    Continue,
    Done,
}

/// Lazily decodes a report into [`ResultRecord`]s in document order.
///
/// The first error ends the sequence; records already yielded stay valid.
pub struct ReportDecoder {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    schema: Schema,
    election: ElectionInfo,
    path: Vec<Element>,
    header_field: Option<HeaderField>,
    contest: Option<String>,
    choice: Option<ChoiceFrame>,
    vote_type: Option<VoteTypeFrame>,
    finished: bool,
}

impl ReportDecoder {
    /// Detect the schema and read the report header.
    pub fn new(document: Vec<u8>) -> Result<Self> {
        let schema = Schema::detect(&document)?;

        let mut reader = Reader::from_reader(Cursor::new(document));
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.trim_text(true);

        let mut decoder = Self {
            reader,
            buf: Vec::new(),
            schema,
            election: ElectionInfo::default(),
            path: Vec::new(),
            header_field: None,
            contest: None,
            choice: None,
            vote_type: None,
            finished: false,
        };
        decoder.read_header()?;
        Ok(decoder)
    }

    /// Decode a report from any reader.
    pub fn from_reader(mut source: impl Read) -> Result<Self> {
        let mut document = Vec::new();
        source.read_to_end(&mut document)?;
        Self::new(document)
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Header fields read ahead of the first contest.
    pub fn election(&self) -> &ElectionInfo {
        &self.election
    }

    /// Counts only exist inside a contest, so nothing is emitted here.
    fn read_header(&mut self) -> Result<()> {
        while self.contest.is_none() && !self.finished {
            if let Step::Done = self.step()? {
                self.finished = true;
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Step> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();

        let step = match self.reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => self.on_start(&e),
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                self.on_end(&name)
            }
            Ok(Event::Text(t)) => self.on_text(&t),
            Ok(Event::Eof) => self.on_eof(),
            Ok(_) => Ok(Step::Continue),
            Err(e) => Err(AppError::decode(self.element_path(), e)),
        };

        self.buf = buf;
        step
    }

    fn element_path(&self) -> String {
        if self.path.is_empty() {
            return "(document)".to_string();
        }
        self.path
            .iter()
            .map(Element::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    fn on_start(&mut self, e: &BytesStart) -> Result<Step> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let parent = self.path.last().map(|el| el.name.clone());
        let grandparent = self
            .path
            .len()
            .checked_sub(2)
            .map(|i| self.path[i].name.clone());

        let label_key = match name.as_str() {
            "Contest" | "Choice" => Some("text"),
            "VoteType" | "County" | "Precinct" => Some("name"),
            _ => None,
        };
        let label = label_key.and_then(|key| e.try_get_attribute(key).ok().flatten()).map(|a| {
            String::from_utf8_lossy(&a.value).into_owned()
        });
        self.path.push(Element {
            name: name.clone(),
            label,
        });
        let path = self.element_path();

        match (parent.as_deref(), name.as_str()) {
            (None, ROOT) => {}
            (None, other) => {
                return Err(AppError::UnknownSchema(format!("root element is <{other}>")));
            }
            (Some(ROOT), "ElectionName") => self.header_field = Some(HeaderField::Name),
            (Some(ROOT), "ElectionDate") => self.header_field = Some(HeaderField::Date),
            (Some(ROOT), "Timestamp") => self.header_field = Some(HeaderField::Timestamp),
            (Some(ROOT), "Region") => self.header_field = Some(HeaderField::Region),
            (Some(ROOT), "ElectionVoterTurnout") => {
                self.election.turnout = turnout(e, &path)?;
            }
            (Some("Counties" | "Precincts"), unit)
                if grandparent.as_deref() == Some("ElectionVoterTurnout") =>
            {
                if let Some(level) = rows::unit_level(unit) {
                    let name = rows::required_attr(e, "name", &path)?;
                    self.election
                        .unit_turnout
                        .push((ReportingUnit { level, name }, turnout(e, &path)?));
                }
            }
            (Some(ROOT), "Contest") => {
                self.contest = Some(rows::required_attr(e, "text", &path)?);
            }
            (Some("Contest"), "Choice") => {
                self.choice = Some(rows::choice(e, &path)?);
            }
            (Some("Contest"), "VoteType") => {
                self.vote_type = Some(rows::vote_type(e, &path)?);
            }
            (Some("Choice"), child) => {
                let child = match self.schema {
                    Schema::FlatChoice => rows::flat_child(child, e, &path)?,
                    Schema::TypedVoteRows => rows::typed_child(child, e, &path)?,
                };
                match child {
                    ChoiceChild::Row(row) => return self.emit(row, &path),
                    ChoiceChild::VoteType(frame) => self.vote_type = Some(frame),
                    ChoiceChild::Ignore => {}
                }
            }
            (Some("VoteType"), child) => {
                if let Some(frame) = &self.vote_type {
                    if let Some(row) = rows::vote_type_unit(frame, child, e, &path)? {
                        return self.emit(row, &path);
                    }
                }
            }
            _ => {}
        }

        Ok(Step::Continue)
    }

    fn on_end(&mut self, name: &str) -> Result<Step> {
        let path = self.element_path();
        let step = match name {
            "Contest" => {
                self.contest = None;
                Step::Continue
            }
            "Choice" => match self.choice.take() {
                Some(frame) => match rows::choice_aggregate(&frame, &path)? {
                    Some(row) => Step::Emit(self.record(row, Some(&frame), &path)?),
                    None => Step::Continue,
                },
                None => Step::Continue,
            },
            "VoteType" => match self.vote_type.take() {
                Some(frame) => match rows::vote_type_aggregate(&frame, &path)? {
                    Some(row) => self.emit(row, &path)?,
                    None => Step::Continue,
                },
                None => Step::Continue,
            },
            _ => {
                self.header_field = None;
                Step::Continue
            }
        };

        self.path.pop();
        Ok(step)
    }

    fn on_text(&mut self, t: &BytesText) -> Result<Step> {
        let Some(field) = self.header_field else {
            return Ok(Step::Continue);
        };
        let text = t
            .unescape()
            .map_err(|e| AppError::decode(self.element_path(), e))?
            .into_owned();

        let slot = match field {
            HeaderField::Name => &mut self.election.name,
            HeaderField::Date => &mut self.election.date_text,
            HeaderField::Timestamp => &mut self.election.timestamp,
            HeaderField::Region => &mut self.election.region,
        };
        slot.get_or_insert_with(String::new).push_str(&text);

        Ok(Step::Continue)
    }

    fn on_eof(&mut self) -> Result<Step> {
        if self.path.is_empty() {
            Ok(Step::Done)
        } else {
            Err(AppError::decode(
                self.element_path(),
                "unexpected end of document",
            ))
        }
    }

    /// Attach contest and choice text and count the row against its parents.
    fn emit(&mut self, row: Row, path: &str) -> Result<Step> {
        if let Some(frame) = self.vote_type.as_mut() {
            frame.rows += 1;
        }
        if let Some(frame) = self.choice.as_mut() {
            frame.rows += 1;
        }
        Ok(Step::Emit(self.record(row, self.choice.as_ref(), path)?))
    }

    fn record(&self, row: Row, choice: Option<&ChoiceFrame>, path: &str) -> Result<ResultRecord> {
        let contest = self
            .contest
            .clone()
            .ok_or_else(|| AppError::decode(path, "vote count outside a contest"))?;

        Ok(ResultRecord {
            contest,
            choice: choice.map(|c| c.text.clone()),
            party: choice.and_then(|c| c.party.clone()),
            votes: row.votes,
            vote_type: row.vote_type,
            reporting_unit: row.unit,
            jurisdiction: None,
        })
    }
}

fn turnout(e: &BytesStart, path: &str) -> Result<Turnout> {
    Ok(Turnout {
        total_voters: rows::count_attr(e, "totalVoters", path)?,
        ballots_cast: rows::count_attr(e, "ballotsCast", path)?,
    })
}

impl Iterator for ReportDecoder {
    type Item = Result<ResultRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.step() {
                Ok(Step::Emit(record)) => return Some(Ok(record)),
                Ok(Step::Continue) => {}
                Ok(Step::Done) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        None
    }
}

impl FusedIterator for ReportDecoder {}
