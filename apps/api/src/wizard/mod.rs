// CV wizard: step topology, form store, progress view, validation gate,
// durable sessions and their HTTP handlers.
// Store operations are synchronous; I/O happens only in `session`.

pub mod form_data;
pub mod handlers;
pub mod progress;
pub mod session;
pub mod storage;
pub mod store;
pub mod topology;
pub mod validation;

pub use session::WizardSessions;
pub use storage::{DurableStorage, MemoryStorage, RedisStorage};
