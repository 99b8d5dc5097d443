pub mod error;
pub mod pool;
pub mod queue;

pub use error::{Error, ErrorKind, Result};
pub use pool::{TaskFailure, WorkerPool};
pub use queue::{Task, TaskQueue};
