pub mod calculator;
pub mod data_source;
pub mod date_index;
pub mod store;
pub mod types;

pub use entity;

pub use calculator::{
    queue::{RuleKind, Task},
    CalcError, Calculator,
};
pub use date_index::DateIndexer;
pub use store::{DbStore, MemoryStore, Store, StoreError};
pub use types::{DayIndex, DayRecord, OsType, Span};
