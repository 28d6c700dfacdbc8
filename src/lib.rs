// Library interface for testing

// Declare all modules
pub mod client;
pub mod config;
pub mod constants;
pub mod db;
pub mod location;
pub mod queries;
pub mod record;
pub mod schema;
pub mod serve;
pub mod upload;
pub mod views;

// Re-export the expected database version for convenience
pub use constants::EXPECTED_DB_VERSION;
