pub mod abi;
pub mod algod;
pub mod connection;
pub mod constants;
pub mod mnemonic;
pub mod signer;
