pub mod audit;
pub mod master_key_storage;
