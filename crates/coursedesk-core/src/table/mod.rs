// ── Table state, location binding, and local post-processing ──

pub mod location;
pub mod process;
pub mod state;

pub use location::{Location, MemoryLocation};
pub use process::{cell_text, process};
pub use state::{TableState, TableStatePatch, TableStateStore};
