pub mod filter_chain;
pub mod filter_operation;
pub mod filter_settings;
