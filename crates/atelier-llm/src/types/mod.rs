pub mod message;

pub use message::{ApiMessage, ApiRole};
