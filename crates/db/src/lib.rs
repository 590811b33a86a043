pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{DbPool, connect};
pub use fixtures::{DemoSeedDataset, SeedVerification};
