pub mod bundle;
pub mod contract;
pub mod recommendation;
