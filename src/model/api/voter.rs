use serde::{Deserialize, Serialize};

use crate::model::{
    common::valid_grade,
    db::voter::{NewVoter, Voter, VoterCore},
    mongodb::Id,
};

/// Roster entry as shown to admins. Passcodes are included; the admin
/// prints and distributes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterView {
    pub id: Id,
    pub lrn: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: u8,
    pub passcode: String,
    pub has_voted: bool,
}

impl From<Voter> for VoterView {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            lrn: voter.voter.lrn,
            first_name: voter.voter.first_name,
            last_name: voter.voter.last_name,
            grade_level: voter.voter.grade_level,
            passcode: voter.voter.passcode,
            has_voted: voter.voter.has_voted,
        }
    }
}

/// Identity fields for creating or editing a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSpec {
    pub lrn: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: u8,
}

impl TryFrom<VoterSpec> for NewVoter {
    type Error = &'static str;

    /// Validate the identity fields and derive the passcode.
    fn try_from(spec: VoterSpec) -> Result<Self, Self::Error> {
        if spec.lrn.chars().count() < 5 {
            return Err("LRN must be at least 5 characters");
        }
        if !valid_grade(spec.grade_level) {
            return Err("Grade level out of range");
        }
        Ok(NewVoter::new(
            spec.lrn,
            spec.first_name,
            spec.last_name,
            spec.grade_level,
        ))
    }
}

/// Summary of a bulk roster import.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows inserted.
    pub imported: usize,
    /// Rows skipped because the LRN was already registered.
    pub skipped: usize,
    /// 1-based line numbers that could not be parsed.
    pub invalid_lines: Vec<usize>,
}

/// Parse a roster CSV: the header line is ignored and the columns are
/// `lrn,first_name,last_name,grade_level`. Splitting is deliberately
/// naive; fields cannot contain commas.
pub fn parse_roster(input: &str) -> (Vec<NewVoter>, Vec<usize>) {
    let mut voters = Vec::new();
    let mut invalid_lines = Vec::new();

    for (index, line) in input.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let spec = match fields.as_slice() {
            [lrn, first_name, last_name, grade_level] => {
                grade_level.parse::<u8>().ok().map(|grade_level| VoterSpec {
                    lrn: lrn.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    grade_level,
                })
            }
            _ => None,
        };
        match spec.and_then(|spec| VoterCore::try_from(spec).ok()) {
            Some(voter) => voters.push(voter),
            None => invalid_lines.push(index + 1),
        }
    }

    (voters, invalid_lines)
}
