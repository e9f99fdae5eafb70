use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The SSLG offices up for election, in ballot order.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    President,
    VicePresident,
    Secretary,
    Treasurer,
    Auditor,
    PublicInformationOfficer,
    PeaceOfficer,
    GradeRepresentative,
}

impl Position {
    /// Every position, in the order races appear on the ballot.
    pub const ALL: [Position; 8] = [
        Position::President,
        Position::VicePresident,
        Position::Secretary,
        Position::Treasurer,
        Position::Auditor,
        Position::PublicInformationOfficer,
        Position::PeaceOfficer,
        Position::GradeRepresentative,
    ];

    /// Grade representatives run per grade level; every other office is
    /// school-wide.
    pub fn is_grade_representative(&self) -> bool {
        matches!(self, Position::GradeRepresentative)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::President => "President",
            Position::VicePresident => "Vice President",
            Position::Secretary => "Secretary",
            Position::Treasurer => "Treasurer",
            Position::Auditor => "Auditor",
            Position::PublicInformationOfficer => "Public Information Officer",
            Position::PeaceOfficer => "Peace Officer",
            Position::GradeRepresentative => "Grade Representative",
        };
        write!(f, "{name}")
    }
}
