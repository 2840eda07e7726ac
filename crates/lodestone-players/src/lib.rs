//! Classification & scoring engine (spec §4.J) over the player/cluster
//! store. Identity and cluster operations (`ensurePlayer`, `linkWallet`,
//! `getOrCreateCluster`, spec §4.I) are implemented directly on
//! `lodestone_db::Storage` since they are thin, transactional, single-table
//! operations with no further business logic to layer on top; this crate
//! is the part of the player domain that does have its own logic: folding
//! rollups into scores and driving reclassification.

pub mod engine;
pub mod error;
pub mod schedule;
pub mod scoring;

pub use error::{PlayersError, Result};
