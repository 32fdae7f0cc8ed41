pub mod fees;
pub mod transaction;
