pub mod error;
pub mod memory;
pub mod seed;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use seed::Seed;
pub use store::{
    ChannelStore, ClusterStore, GroupStore, NodeInfoQuery, NodeInfoStore, RecordStore, RuleStore,
};
