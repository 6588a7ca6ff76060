pub mod error;
pub mod models;
pub mod storage;
pub mod store;

pub use error::{Result, StoreError};
pub use models::{ChatMessage, ChatSession, Role};
pub use storage::SessionFile;
pub use store::{SessionStore, Snapshot};
