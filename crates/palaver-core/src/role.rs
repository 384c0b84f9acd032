//! Executive roles on a negotiation team.
//!
//! Every team is a four-seat executive committee (a fifth seat duplicates
//! VP Marketing). Roles carry a stable wire name, a human display name,
//! and a UI accent color so that every surface renders them identically.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One of the four executive roles a participant can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    #[cfg_attr(feature = "serde", serde(rename = "CEO"))]
    Ceo,
    #[cfg_attr(feature = "serde", serde(rename = "VP_Operations"))]
    VpOperations,
    #[cfg_attr(feature = "serde", serde(rename = "VP_Finance"))]
    VpFinance,
    #[cfg_attr(feature = "serde", serde(rename = "VP_Marketing"))]
    VpMarketing,
}

impl Role {
    /// All roles, in briefing order.
    pub const ALL: [Role; 4] = [
        Role::Ceo,
        Role::VpOperations,
        Role::VpFinance,
        Role::VpMarketing,
    ];

    /// Stable identifier used in storage and on the wire.
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::VpOperations => "VP_Operations",
            Role::VpFinance => "VP_Finance",
            Role::VpMarketing => "VP_Marketing",
        }
    }

    /// Human-readable name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::VpOperations => "VP Operations",
            Role::VpFinance => "VP Finance",
            Role::VpMarketing => "VP Marketing",
        }
    }

    /// Accent color as a CSS hex string.
    pub const fn color(&self) -> &'static str {
        match self {
            Role::Ceo => "#9333ea",
            Role::VpOperations => "#2563eb",
            Role::VpFinance => "#16a34a",
            Role::VpMarketing => "#ea580c",
        }
    }

    /// Parse a wire name back into a role.
    pub fn from_wire(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.wire_name() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_wire(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Error for a role name that matches none of the four wire names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

/// Display name for a possibly-unassigned participant.
pub fn role_display_name(role: Option<Role>) -> &'static str {
    match role {
        Some(r) => r.display_name(),
        None => "Unassigned",
    }
}

/// Accent color for a possibly-unassigned participant (gray fallback).
pub fn role_color(role: Option<Role>) -> &'static str {
    match role {
        Some(r) => r.color(),
        None => "#6b7280",
    }
}
