//! Role hierarchy
//!
//! Roles form a total order `Guest < Member < Moderator < Admin`. The
//! ordinal is the only thing a role carries: it is what gets stored, what
//! travels inside tokens and what the access gate compares.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Privilege level. A higher ordinal means more privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Guest = 1,
    Member = 2,
    Moderator = 3,
    Admin = 4,
}

/// An integer outside the defined role range.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid role ordinal: {0}")]
pub struct InvalidRole(pub i64);

impl Role {
    pub const ALL: [Role; 4] = [Role::Guest, Role::Member, Role::Moderator, Role::Admin];

    /// The stable integer form used in storage and token payloads.
    pub fn ordinal(self) -> i16 {
        self as i16
    }

    /// `true` when `self` is at least as privileged as `required`.
    pub fn meets(self, required: Role) -> bool {
        self >= required
    }
}

impl TryFrom<i64> for Role {
    type Error = InvalidRole;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Guest),
            2 => Ok(Role::Member),
            3 => Ok(Role::Moderator),
            4 => Ok(Role::Admin),
            other => Err(InvalidRole(other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

// Roles go over the wire as their ordinals, matching the token payload.
impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Role::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_privilege() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
    }

    #[test]
    fn admin_meets_every_role() {
        for required in Role::ALL {
            assert!(Role::Admin.meets(required), "admin should meet {required}");
        }
    }

    #[test]
    fn guest_does_not_meet_moderator() {
        assert!(!Role::Guest.meets(Role::Moderator));
        assert!(Role::Guest.meets(Role::Guest));
    }

    #[test]
    fn ordinals_round_trip_through_try_from() {
        for role in Role::ALL {
            assert_eq!(Role::try_from(role.ordinal() as i64), Ok(role));
        }
    }

    #[test]
    fn out_of_range_ordinals_are_rejected() {
        assert_eq!(Role::try_from(0), Err(InvalidRole(0)));
        assert_eq!(Role::try_from(5), Err(InvalidRole(5)));
        assert_eq!(Role::try_from(-4), Err(InvalidRole(-4)));
    }

    #[test]
    fn serde_uses_ordinals() {
        let json = serde_json::to_string(&vec![Role::Guest, Role::Admin]).unwrap();
        assert_eq!(json, "[1,4]");

        let roles: Vec<Role> = serde_json::from_str("[2,3]").unwrap();
        assert_eq!(roles, vec![Role::Member, Role::Moderator]);

        assert!(serde_json::from_str::<Role>("9").is_err());
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }
}
