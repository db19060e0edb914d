pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod signal;
pub mod verdict;

pub use config::Config;
pub use error::*;
pub use request::*;
pub use response::*;
pub use signal::*;
pub use verdict::*;
