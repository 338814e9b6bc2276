//! Command implementations

pub mod call;
pub mod import;
pub mod ledger;
pub mod resolve;
