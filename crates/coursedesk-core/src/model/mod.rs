// ── Domain model ──

pub mod entity;
pub mod subject;
pub mod task;
pub mod token;
pub mod user;

pub use entity::EntityKind;
pub use subject::Subject;
pub use task::Task;
pub use token::{EntityToken, decode, encode, encode_str, parse_id_or_token};
pub use user::{Role, User, UserStatus};
