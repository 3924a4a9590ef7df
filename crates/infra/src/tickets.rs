//! Laundry ticket board: the staff-facing resource guarded by both gates.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizops_core::{DomainError, TicketId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Received,
    Washing,
    Ready,
    Collected,
}

impl TicketStatus {
    /// Tickets only move forward.
    fn can_advance_to(self, next: TicketStatus) -> bool {
        (next as u8) > (self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryTicket {
    pub id: TicketId,
    pub customer: String,
    pub items: u32,
    pub status: TicketStatus,
    /// Username or employee id of whoever last touched the ticket.
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket storage abstraction.
pub trait TicketBoard: Send + Sync {
    fn open(&self, customer: &str, items: u32, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError>;
    fn list(&self) -> Vec<LaundryTicket>;
    fn advance(&self, id: TicketId, status: TicketStatus, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError>;
    fn remove(&self, id: TicketId) -> Result<(), DomainError>;
}

impl<S> TicketBoard for Arc<S>
where
    S: TicketBoard + ?Sized,
{
    fn open(&self, customer: &str, items: u32, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError> {
        (**self).open(customer, items, actor, now)
    }

    fn list(&self) -> Vec<LaundryTicket> {
        (**self).list()
    }

    fn advance(&self, id: TicketId, status: TicketStatus, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError> {
        (**self).advance(id, status, actor, now)
    }

    fn remove(&self, id: TicketId) -> Result<(), DomainError> {
        (**self).remove(id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTicketBoard {
    inner: RwLock<HashMap<TicketId, LaundryTicket>>,
}

impl InMemoryTicketBoard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketBoard for InMemoryTicketBoard {
    fn open(&self, customer: &str, items: u32, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError> {
        let customer = customer.trim();
        if customer.is_empty() {
            return Err(DomainError::validation("customer cannot be empty"));
        }
        if items == 0 {
            return Err(DomainError::validation("a ticket needs at least one item"));
        }

        let ticket = LaundryTicket {
            id: TicketId::new(),
            customer: customer.to_string(),
            items,
            status: TicketStatus::Received,
            updated_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("ticket board lock poisoned"))?;
        map.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn list(&self) -> Vec<LaundryTicket> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut tickets: Vec<LaundryTicket> = map.values().cloned().collect();
        tickets.sort_by_key(|t| (t.created_at, t.id));
        tickets
    }

    fn advance(&self, id: TicketId, status: TicketStatus, actor: &str, now: DateTime<Utc>) -> Result<LaundryTicket, DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("ticket board lock poisoned"))?;
        let ticket = map.get_mut(&id).ok_or(DomainError::NotFound)?;
        if !ticket.status.can_advance_to(status) {
            return Err(DomainError::invariant(format!(
                "cannot move ticket from {:?} to {:?}",
                ticket.status, status
            )));
        }
        ticket.status = status;
        ticket.updated_by = actor.to_string();
        ticket.updated_at = now;
        Ok(ticket.clone())
    }

    fn remove(&self, id: TicketId) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("ticket board lock poisoned"))?;
        map.remove(&id).map(|_| ()).ok_or(DomainError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_only_move_forward() {
        let board = InMemoryTicketBoard::new();
        let ticket = board.open("Mrs. Okafor", 3, "alice", Utc::now()).unwrap();

        let ready = board.advance(ticket.id, TicketStatus::Ready, "E1001", Utc::now()).unwrap();
        assert_eq!(ready.status, TicketStatus::Ready);
        assert_eq!(ready.updated_by, "E1001");

        let err = board.advance(ticket.id, TicketStatus::Washing, "E1001", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn open_validates_input() {
        let board = InMemoryTicketBoard::new();
        assert!(board.open("  ", 1, "alice", Utc::now()).is_err());
        assert!(board.open("Bob", 0, "alice", Utc::now()).is_err());
    }

    #[test]
    fn remove_missing_is_not_found() {
        let board = InMemoryTicketBoard::new();
        assert_eq!(board.remove(TicketId::new()), Err(DomainError::NotFound));
    }
}
