//! Infrastructure layer: credential storage, token issuance, the access gate
//! and the staff-facing ticket board.

pub mod admin;
pub mod credential_store;
pub mod deadline;
pub mod gate;
pub mod issuer;
pub mod tickets;

pub use admin::{AccessAdmin, AdminError, EnrollStaff};
pub use credential_store::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore, StoreError};
pub use gate::{AccessGate, extract_bearer};
pub use issuer::{LoginOutcome, Registration, TokenIssuer};
pub use tickets::{InMemoryTicketBoard, LaundryTicket, TicketBoard, TicketStatus};
