//! Reference components built on the core contract.

pub mod register_file;

pub use register_file::RegisterFile;
