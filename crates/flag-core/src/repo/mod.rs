pub mod memory;
pub mod types;

pub use memory::InMemoryFlagStore;
pub use types::{ApprovalFilter, FlagStore, RiskRecord, StoreError};
