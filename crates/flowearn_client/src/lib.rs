pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod models;
pub mod projection;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use error::{ActionError, LedgerError, ValidationError};
pub use gateway::{ContractGateway, LedgerReader, LedgerWriter};
pub use models::{Task, TaskId};
pub use wallet::WalletContext;
