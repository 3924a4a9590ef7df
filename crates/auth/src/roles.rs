use serde::{Deserialize, Serialize};

use bizops_core::DomainError;

/// Which credential partition an identity belongs to.
///
/// Core users and service (staff) users live in separate partitions and never
/// satisfy each other's gates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Core,
    Service,
}

impl core::fmt::Display for Partition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Partition::Core => f.write_str("core"),
            Partition::Service => f.write_str("service"),
        }
    }
}

/// Role of a core user. Declaration order is the privilege order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoreRole {
    /// Registered but not yet approved; cannot log in.
    #[default]
    Pending,
    Standard,
    Admin,
    Superadmin,
}

impl CoreRole {
    pub const ALL: [CoreRole; 4] = [
        CoreRole::Pending,
        CoreRole::Standard,
        CoreRole::Admin,
        CoreRole::Superadmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoreRole::Pending => "pending",
            CoreRole::Standard => "standard",
            CoreRole::Admin => "admin",
            CoreRole::Superadmin => "superadmin",
        }
    }
}

impl core::fmt::Display for CoreRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CoreRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(CoreRole::Pending),
            "standard" => Ok(CoreRole::Standard),
            "admin" => Ok(CoreRole::Admin),
            "superadmin" => Ok(CoreRole::Superadmin),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Role of a service (staff) user. Distinct vocabulary from [`CoreRole`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ServiceRole {
    #[default]
    #[serde(rename = "service-standard")]
    Standard,
    #[serde(rename = "service-admin")]
    Admin,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Standard => "service-standard",
            ServiceRole::Admin => "service-admin",
        }
    }
}

impl core::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ServiceRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "service-standard" => Ok(ServiceRole::Standard),
            "service-admin" => Ok(ServiceRole::Admin),
            other => Err(DomainError::validation(format!("unknown service role '{other}'"))),
        }
    }
}

/// Membership tier of a core user. Orthogonal to role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    #[default]
    None,
    Standard,
    Platinum,
    Vip,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::None => "none",
            MembershipTier::Standard => "standard",
            MembershipTier::Platinum => "platinum",
            MembershipTier::Vip => "vip",
        }
    }
}

impl core::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MembershipTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MembershipTier::None),
            "standard" => Ok(MembershipTier::Standard),
            "platinum" => Ok(MembershipTier::Platinum),
            "vip" => Ok(MembershipTier::Vip),
            other => Err(DomainError::validation(format!("unknown membership '{other}'"))),
        }
    }
}
