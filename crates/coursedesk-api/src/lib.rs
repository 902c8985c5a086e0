// coursedesk-api: Async Rust client for the Coursedesk admin REST API

pub mod client;
pub mod envelope;
pub mod error;
pub mod query;
pub mod session;
pub mod transport;

pub use client::{AdminClient, Body, FormPart, FormValue, Method, Mutation, admin_entity_path, admin_path};
pub use envelope::{Normalized, Pagination, Payload, normalize};
pub use error::Error;
pub use query::{FilterRule, ListQuery, PageRequest, Relation, SortOrder, SortRule};
pub use session::{MemoryTokenStore, Session, TokenStore};
pub use transport::{TlsMode, TransportConfig};
