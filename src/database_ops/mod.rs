//! SQLite persistence for every pipeline table. Functions take an explicit
//! [`Db`] handle (or a connection inside a caller's transaction).

pub mod cards;
pub mod db;
pub mod decklists;
pub mod matches;
pub mod results;
pub mod schema;
pub mod standings;
pub mod tournaments;

pub use db::{Db, TableCounts};
pub use standings::{apply_standing, StandingSnapshot, StandingWrite};
