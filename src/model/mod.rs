mod config;
mod entities;
mod error;
mod links;
mod request;
mod response;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use links::*;
pub use request::*;
pub use response::*;
