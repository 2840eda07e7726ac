//! Chain access layer: chunked/retrying RPC reads (spec §4.A), the USD
//! price graph (spec §4.C), and pool discovery (spec §4.D).

pub mod client;
pub mod error;
pub mod pool_discovery;
pub mod price_graph;
pub mod retry;
pub mod warmer;

pub use client::ChainClient;
pub use error::{ChainError, Result};
pub use pool_discovery::{discover_pools, AlloyReserveReader};
pub use price_graph::{PoolReserves, PriceGraphBuilder, PriceGraphResult};
pub use warmer::{PriceCache, DEFAULT_REFRESH_INTERVAL};
