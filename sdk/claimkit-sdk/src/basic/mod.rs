pub mod claim;
pub mod contract;
