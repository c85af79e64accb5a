// src/report/schema.rs

//! Report schema detection.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{AppError, Result};

pub(crate) const ROOT: &str = "ElectionResult";

/// Layout of the counts below a `Choice` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `Choice[totalVotes] > County|Precinct[votes]`
    FlatChoice,
    /// `Choice > VoteType[name, votes] > County|Precinct[votes]`
    TypedVoteRows,
}

impl Schema {
    /// Probe a document for its schema.
    ///
    /// Reads only until the first element nested in a `Choice`. Documents
    /// whose choices are all empty decode the same either way and report
    /// [`Schema::FlatChoice`].
    ///
    /// Only a bad root is an error here. Malformed XML after the root also
    /// reports [`Schema::FlatChoice`]: the decoder reaches the same fault
    /// before it ever needs the layout, and reports it in order after the
    /// records that precede it.
    pub fn detect(document: &[u8]) -> Result<Schema> {
        let mut reader = Reader::from_reader(document);
        reader.config_mut().expand_empty_elements = true;

        let mut stack: Vec<String> = Vec::new();
        let mut saw_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

                    if !saw_root {
                        if name != ROOT {
                            return Err(AppError::UnknownSchema(format!(
                                "root element is <{name}>, expected <{ROOT}>"
                            )));
                        }
                        saw_root = true;
                    } else if stack.last().map(String::as_str) == Some("Choice") {
                        match name.as_str() {
                            "VoteType" => return Ok(Schema::TypedVoteRows),
                            "County" | "Precinct" => return Ok(Schema::FlatChoice),
                            _ => {}
                        }
                    }

                    stack.push(name);
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) if saw_root => return Ok(Schema::FlatChoice),
                Ok(Event::Eof) => {
                    return Err(AppError::UnknownSchema(
                        "document has no root element".to_string(),
                    ));
                }
                Ok(_) => {}
                Err(e) if saw_root => {
                    log::debug!("Schema probe stopped early at {}: {}", stack.join("/"), e);
                    return Ok(Schema::FlatChoice);
                }
                Err(e) => return Err(AppError::decode("(document)", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_typed_rows() {
        let doc = br#"<?xml version="1.0"?>
            <ElectionResult>
              <Contest text="Governor">
                <ParticipatingCounties><County name="Benton"/></ParticipatingCounties>
                <Choice text="A"><VoteType name="Absentee" votes="1"/></Choice>
              </Contest>
            </ElectionResult>"#;
        assert_eq!(Schema::detect(doc).unwrap(), Schema::TypedVoteRows);
    }

    #[test]
    fn test_detects_flat_rows() {
        let doc = br#"<ElectionResult><Contest text="Governor">
              <Choice text="A" totalVotes="3"/>
              <Choice text="B" totalVotes="2"><Precinct name="P1" votes="2"/></Choice>
            </Contest></ElectionResult>"#;
        assert_eq!(Schema::detect(doc).unwrap(), Schema::FlatChoice);
    }

    #[test]
    fn test_empty_choices_are_flat() {
        let doc = br#"<ElectionResult><Contest text="X"><Choice text="A" totalVotes="1"/></Contest></ElectionResult>"#;
        assert_eq!(Schema::detect(doc).unwrap(), Schema::FlatChoice);
    }

    #[test]
    fn test_malformed_body_is_left_to_the_decoder() {
        let truncated = br#"<ElectionResult><Contest text="X"><Choice text="A" totalVotes="1"/><Choice text="B" tota"#;
        assert_eq!(Schema::detect(truncated).unwrap(), Schema::FlatChoice);

        let mismatched = br#"<ElectionResult><Contest text="X"><Choice text="A"></Contest></ElectionResult>"#;
        assert_eq!(Schema::detect(mismatched).unwrap(), Schema::FlatChoice);
    }

    #[test]
    fn test_malformed_prolog_is_a_decode_error() {
        assert!(matches!(
            Schema::detect(b"<ElectionResult"),
            Err(AppError::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_root() {
        let doc = b"<html><body>Not found</body></html>";
        assert!(matches!(
            Schema::detect(doc),
            Err(AppError::UnknownSchema(_))
        ));
        assert!(matches!(
            Schema::detect(b""),
            Err(AppError::UnknownSchema(_))
        ));
    }
}
