pub mod error;
pub mod todo;
pub mod retry;
pub mod service;

pub use error::*;
pub use todo::*;
pub use retry::*;
pub use service::*;
