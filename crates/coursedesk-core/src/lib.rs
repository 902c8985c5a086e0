// coursedesk-core: Table state, fetch reconciliation, and modal action
// coordination shared by the Coursedesk CLI and TUI.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod forms;
pub mod listing;
pub mod model;
pub mod mutate;
pub mod stream;
pub mod table;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, DEFAULT_PAGE_SIZE, FilterDiscipline, TlsVerification};
pub use coordinator::{
    ActionCoordinator, EntityRef, ModalKind, ModalState, RefetchRegistration, RefreshFn, Settled,
};
pub use error::CoreError;
pub use fetch::{FetchRequest, FetchResult, Query};
pub use forms::{EditForm, FormField, SubjectForm, TaskForm, UserForm};
pub use listing::Listing;
pub use mutate::{MutationState, Mutator};
pub use stream::StateStream;
pub use table::{
    Location, MemoryLocation, TableState, TableStatePatch, TableStateStore, cell_text, process,
};
pub use view::{
    ActionDispatch, ActionTarget, CellKind, Column, RenderedRow, RowAction, StatusTone, TableView,
};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    EntityKind, EntityToken, Role, Subject, Task, User, UserStatus, decode, encode, encode_str,
    parse_id_or_token,
};

// ── Transport-level types callers need ──────────────────────────────
pub use coursedesk_api::{
    AdminClient, FilterRule, ListQuery, Mutation, Pagination, Payload, Relation, Session, SortOrder,
    SortRule, TokenStore,
};
