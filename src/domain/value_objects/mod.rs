pub mod agent_name;
pub mod local_id;
pub mod record_id;
pub mod sync_state;

pub use local_id::LocalId;
pub use record_id::RecordId;
pub use sync_state::{PhotoState, SyncState};
