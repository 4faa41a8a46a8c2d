pub mod error;
pub mod fixture;
pub mod gather;
pub mod provider;
pub mod types;
