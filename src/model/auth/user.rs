use std::fmt::{self, Display, Formatter};

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::db::{settings, voter::Voter};

/// A user of our application, having defined rights.
pub trait User {
    /// The rights of this user type.
    const RIGHTS: Rights;
    /// The token subject identifying the user.
    fn subject(&self) -> String;
}

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Admin = 1,
    SuperAdmin = 2,
}

impl Display for Rights {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
                Self::SuperAdmin => "superadmin",
            }
        )
    }
}

impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;

    fn subject(&self) -> String {
        self.id.to_string()
    }
}

/// The dashboard admin. Authenticated against the hashed passcode in the
/// config collection rather than a database record of their own.
pub struct Admin;

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;

    fn subject(&self) -> String {
        settings::ADMIN_USERNAME.to_string()
    }
}

/// The maintenance super-admin.
pub struct SuperAdmin;

impl User for SuperAdmin {
    const RIGHTS: Rights = Rights::SuperAdmin;

    fn subject(&self) -> String {
        settings::SUPER_ADMIN_USERNAME.to_string()
    }
}
