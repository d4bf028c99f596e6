pub mod commands;
pub mod execute;

pub use commands::Commands;
