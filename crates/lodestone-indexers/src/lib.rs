//! Event indexer fleet and daily aggregator (spec §4.E, §4.F): one
//! `SliceWorker` implementation per event kind, sharing the checkpoint
//! loop in [`worker`], plus the daily rollup in [`daily_aggregate`].

pub mod abi;
pub mod bridge;
pub mod daily_aggregate;
pub mod deposit_watch;
pub mod error;
pub mod hunt;
pub mod marketplace;
pub mod readers;
pub mod reward;
pub mod stake;
pub mod swap;
pub mod tournament;
pub mod worker;

pub use deposit_watch::DepositWatcher;
pub use error::{IndexerError, Result};
pub use readers::{AlloyUserInfoReader, GameApiReader};
pub use worker::SliceWorker;
