pub mod store;

pub use store::{HistoryRecord, HistoryStore, MemoryHistoryStore, NewHistoryRecord};
