//! Read-side analytics API (spec §4.G): pool/staker/wallet rollups layered
//! over the daily-aggregate cache, the price graph, and on-chain reads.
//! Every entry point takes a [`deadline::Deadline`] and returns a
//! [`deadline::Partial`] rather than silently truncating.

pub mod deadline;
pub mod error;
pub mod pending_rewards_reader;
pub mod pool_analytics;
pub mod wallet_rewards;

pub use error::{AnalyticsError, Result};
pub use pending_rewards_reader::AlloyPendingRewardsReader;
pub use pool_analytics::{get_all_pool_analytics, get_pool_analytics, get_pool_stakers, AnalyticsSource, PoolAnalytics};
pub use wallet_rewards::{get_wallet_rewards, PendingRewardsReader, PoolReward};
