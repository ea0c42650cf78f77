//! Human-facing user codes such as `C7` or `SA12`.
//!
//! Every non-admin role owns one row in `role_counters`. Allocating a code
//! bumps that row with a single upsert so concurrent creations can never
//! read the same value.

use std::fmt;
use std::str::FromStr;

use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::RoleCounter;
use crate::schema::role_counters;

/// Every admin shares this code.
pub const ADMIN_DISPLAY_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Creator,
    Approver,
    SuperApprover,
    Uploader,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Creator,
        Role::Approver,
        Role::SuperApprover,
        Role::Uploader,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Creator => "CREATOR",
            Role::Approver => "APPROVER",
            Role::SuperApprover => "SUPER_APPROVER",
            Role::Uploader => "UPLOADER",
        }
    }

    /// Prefix placed in front of the counter value. Admins are not counted.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Role::Admin => None,
            Role::Creator => Some("C"),
            Role::Approver => Some("A"),
            Role::SuperApprover => Some("SA"),
            Role::Uploader => Some("U"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Role::ALL.iter().map(|role| role.as_str()).collect();
        write!(
            f,
            "unknown role '{}', expected one of {}",
            self.0,
            known.join(", ")
        )
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

/// Allocates the next display id for `role`.
///
/// Run this inside the transaction that inserts the user so a failed insert
/// also rolls the counter back.
pub fn next_display_id(conn: &mut PgConnection, role: Role) -> QueryResult<String> {
    let Some(prefix) = role.prefix() else {
        return Ok(ADMIN_DISPLAY_ID.to_string());
    };

    let counter: RoleCounter = diesel::insert_into(role_counters::table)
        .values((
            role_counters::role.eq(role.as_str()),
            role_counters::count.eq(1),
        ))
        .on_conflict(role_counters::role)
        .do_update()
        .set(role_counters::count.eq(role_counters::count + 1))
        .get_result(conn)?;

    Ok(format_display_id(prefix, counter.count))
}

fn format_display_id(prefix: &str, count: i32) -> String {
    format!("{prefix}{count}")
}
