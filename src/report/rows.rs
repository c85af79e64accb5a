// src/report/rows.rs

//! Leaf vote counts for each schema variant.
//!
//! Each function looks at one element and its attributes only; the decoder
//! owns traversal and attaches contest and choice text.

use quick_xml::events::BytesStart;

use crate::error::{AppError, Result};
use crate::models::{Level, ReportingUnit, VoteType};

/// A leaf count before contest and choice text are attached.
#[derive(Debug)]
pub(super) struct Row {
    pub votes: u64,
    pub vote_type: Option<VoteType>,
    pub unit: Option<ReportingUnit>,
}

/// Open `Choice` element.
#[derive(Debug)]
pub(super) struct ChoiceFrame {
    pub text: String,
    pub party: Option<String>,
    pub total_votes: Option<u64>,
    pub rows: usize,
}

/// Open `VoteType` element, under a choice or directly under a contest.
#[derive(Debug)]
pub(super) struct VoteTypeFrame {
    pub vote_type: VoteType,
    pub votes: Option<u64>,
    pub rows: usize,
}

/// What a child of `Choice` contributes.
pub(super) enum ChoiceChild {
    Row(Row),
    VoteType(VoteTypeFrame),
    Ignore,
}

pub(super) fn choice(element: &BytesStart, path: &str) -> Result<ChoiceFrame> {
    Ok(ChoiceFrame {
        text: required_attr(element, "text", path)?,
        party: attr(element, "party", path)?,
        total_votes: count_attr(element, "totalVotes", path)?,
        rows: 0,
    })
}

pub(super) fn vote_type(element: &BytesStart, path: &str) -> Result<VoteTypeFrame> {
    let label = required_attr(element, "name", path)?;
    Ok(VoteTypeFrame {
        vote_type: VoteType::from_label(&label),
        votes: count_attr(element, "votes", path)?,
        rows: 0,
    })
}

/// Flat choices carry unit rows directly.
pub(super) fn flat_child(name: &str, element: &BytesStart, path: &str) -> Result<ChoiceChild> {
    match unit_level(name) {
        Some(level) => {
            let (unit, votes) = unit_row(level, element, path)?;
            Ok(ChoiceChild::Row(Row {
                votes,
                vote_type: None,
                unit: Some(unit),
            }))
        }
        None if name == "VoteType" => Err(AppError::decode(
            path,
            "vote-type row inside a flat-choice report",
        )),
        None => Ok(ChoiceChild::Ignore),
    }
}

/// Typed choices nest unit rows inside vote-type rows.
pub(super) fn typed_child(name: &str, element: &BytesStart, path: &str) -> Result<ChoiceChild> {
    match name {
        "VoteType" => Ok(ChoiceChild::VoteType(vote_type(element, path)?)),
        _ if unit_level(name).is_some() => Err(AppError::decode(
            path,
            "unit row directly inside a typed-vote-row choice",
        )),
        _ => Ok(ChoiceChild::Ignore),
    }
}

/// Unit row below a `VoteType`, tagged with its vote type.
pub(super) fn vote_type_unit(
    frame: &VoteTypeFrame,
    name: &str,
    element: &BytesStart,
    path: &str,
) -> Result<Option<Row>> {
    let Some(level) = unit_level(name) else {
        return Ok(None);
    };
    let (unit, votes) = unit_row(level, element, path)?;
    Ok(Some(Row {
        votes,
        vote_type: Some(frame.vote_type.clone()),
        unit: Some(unit),
    }))
}

/// A vote-type row with no unit breakdown is itself the leaf.
pub(super) fn vote_type_aggregate(frame: &VoteTypeFrame, path: &str) -> Result<Option<Row>> {
    if frame.rows > 0 {
        return Ok(None);
    }
    let votes = frame
        .votes
        .ok_or_else(|| AppError::decode(path, "missing 'votes' attribute"))?;
    Ok(Some(Row {
        votes,
        vote_type: Some(frame.vote_type.clone()),
        unit: None,
    }))
}

/// A choice with no leaf rows at all reports its own total.
pub(super) fn choice_aggregate(frame: &ChoiceFrame, path: &str) -> Result<Option<Row>> {
    if frame.rows > 0 {
        return Ok(None);
    }
    let votes = frame
        .total_votes
        .ok_or_else(|| AppError::decode(path, "missing 'totalVotes' attribute"))?;
    Ok(Some(Row {
        votes,
        vote_type: None,
        unit: None,
    }))
}

pub(super) fn unit_level(name: &str) -> Option<Level> {
    match name {
        "County" => Some(Level::County),
        "Precinct" => Some(Level::Precinct),
        _ => None,
    }
}

fn unit_row(level: Level, element: &BytesStart, path: &str) -> Result<(ReportingUnit, u64)> {
    let name = required_attr(element, "name", path)?;
    let votes = count_attr(element, "votes", path)?
        .ok_or_else(|| AppError::decode(path, "missing 'votes' attribute"))?;
    Ok((ReportingUnit { level, name }, votes))
}

/// Attribute value; `None` only when the attribute is absent.
pub(super) fn attr(element: &BytesStart, key: &str, path: &str) -> Result<Option<String>> {
    match element.try_get_attribute(key) {
        Ok(Some(attribute)) => attribute
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|e| AppError::decode(path, e)),
        Ok(None) => Ok(None),
        Err(e) => Err(AppError::decode(path, e)),
    }
}

pub(super) fn required_attr(element: &BytesStart, key: &str, path: &str) -> Result<String> {
    attr(element, key, path)?
        .ok_or_else(|| AppError::decode(path, format!("missing '{key}' attribute")))
}

pub(super) fn count_attr(element: &BytesStart, key: &str, path: &str) -> Result<Option<u64>> {
    attr(element, key, path)?
        .map(|raw| parse_count(&raw, key, path))
        .transpose()
}

/// Vote counts are non-negative integers; anything else is rejected.
fn parse_count(raw: &str, key: &str, path: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::decode(path, format!("invalid {key} '{raw}'")))
}
