//! Infrastructure layer: resource models and the stores behind them.
//!
//! The in-memory store backs tests and local runs; the Postgres store is
//! available behind the `postgres` feature.

pub mod models;
pub mod repository;

pub use models::{NewRace, NewTama, Race, Tama, TamaUpdate, UserUpdate};
pub use repository::{InMemoryStore, RaceRepository, TamaRepository, UserRepository};

#[cfg(feature = "postgres")]
pub use repository::postgres::PostgresStore;
