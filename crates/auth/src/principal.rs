use serde::Serialize;
use uuid::Uuid;

use bizops_core::{ServiceUserId, UserId};

use crate::{CoreRole, MembershipTier, PageAccess, Partition, ServiceRole};

/// Capability view shared by both identity partitions.
///
/// Downstream handlers read role and page access through this interface
/// instead of probing which fields a user object happens to carry.
pub trait Capability {
    fn subject(&self) -> Uuid;
    fn username(&self) -> &str;
    fn partition(&self) -> Partition;
    fn role_name(&self) -> &'static str;
    fn page_access(&self) -> &PageAccess;
}

/// Freshly resolved core user attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreIdentity {
    pub id: UserId,
    pub username: String,
    pub role: CoreRole,
    pub membership: MembershipTier,
    pub page_access: PageAccess,
}

/// Freshly resolved service (staff) user attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceIdentity {
    pub id: ServiceUserId,
    pub employee_id: String,
    pub display_name: String,
    pub role: ServiceRole,
    pub department: String,
    /// Pages the staff member may use (their StaffAccess scope).
    pub scope: PageAccess,
}

/// An authenticated identity, tagged by partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "partition", rename_all = "lowercase")]
pub enum Identity {
    Core(CoreIdentity),
    Service(ServiceIdentity),
}

impl Identity {
    pub fn as_core(&self) -> Option<&CoreIdentity> {
        match self {
            Identity::Core(core) => Some(core),
            Identity::Service(_) => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceIdentity> {
        match self {
            Identity::Service(service) => Some(service),
            Identity::Core(_) => None,
        }
    }
}

impl Capability for CoreIdentity {
    fn subject(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn partition(&self) -> Partition {
        Partition::Core
    }

    fn role_name(&self) -> &'static str {
        self.role.as_str()
    }

    fn page_access(&self) -> &PageAccess {
        &self.page_access
    }
}

impl Capability for ServiceIdentity {
    fn subject(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn username(&self) -> &str {
        &self.employee_id
    }

    fn partition(&self) -> Partition {
        Partition::Service
    }

    fn role_name(&self) -> &'static str {
        self.role.as_str()
    }

    fn page_access(&self) -> &PageAccess {
        &self.scope
    }
}

impl Capability for Identity {
    fn subject(&self) -> Uuid {
        match self {
            Identity::Core(i) => i.subject(),
            Identity::Service(i) => i.subject(),
        }
    }

    fn username(&self) -> &str {
        match self {
            Identity::Core(i) => i.username(),
            Identity::Service(i) => i.username(),
        }
    }

    fn partition(&self) -> Partition {
        match self {
            Identity::Core(i) => i.partition(),
            Identity::Service(i) => i.partition(),
        }
    }

    fn role_name(&self) -> &'static str {
        match self {
            Identity::Core(i) => i.role_name(),
            Identity::Service(i) => i.role_name(),
        }
    }

    fn page_access(&self) -> &PageAccess {
        match self {
            Identity::Core(i) => i.page_access(),
            Identity::Service(i) => i.page_access(),
        }
    }
}

impl From<CoreIdentity> for Identity {
    fn from(value: CoreIdentity) -> Self {
        Identity::Core(value)
    }
}

impl From<ServiceIdentity> for Identity {
    fn from(value: ServiceIdentity) -> Self {
        Identity::Service(value)
    }
}
