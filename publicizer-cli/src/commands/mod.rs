pub mod common;
pub mod publicize;
pub mod types;
