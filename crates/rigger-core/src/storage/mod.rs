//! Storage layer (`SQLite` rows holding JSON documents)

pub mod backups;
pub mod db;
pub mod migrations;
pub mod profiles;
pub mod projects;

pub use backups::BackupStore;
pub use db::{Database, DatabaseError};
pub use profiles::{ProfileStore, ProfileSummary};
pub use projects::ProjectStore;
