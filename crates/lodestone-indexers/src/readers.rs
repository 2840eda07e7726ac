//! Concrete implementations of the reader-trait seams the indexer structs
//! are generic over. `AlloyUserInfoReader` answers `stake::UserInfoReader`
//! with a live `eth_call`; everything else here (`hunt`/`tournament`/
//! `marketplace`) has no view-function equivalent — the drop/placement/
//! listing detail those traits ask for lives in the game's own backend, not
//! the contract — so they're answered by a small shared HTTP client against
//! that backend instead.

use crate::error::{IndexerError, Result};
use crate::hunt::PartySnapshotReader;
use crate::marketplace::{ListingsReader, TavernListingSnapshot};
use crate::stake::UserInfoReader;
use crate::tournament::HeroStatsReader;
use alloy::primitives::Address as AlloyAddress;
use alloy::providers::Provider;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use lodestone_chain::ChainClient;
use lodestone_types::game::PartyLuckSnapshot;
use lodestone_types::ids::{Address, Pid, TxHash};
use serde::Deserialize;

alloy::sol! {
    #[sol(rpc)]
    interface IMasterGardener {
        function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
    }
}

/// On-chain [`UserInfoReader`]: reconciles `StakerPosition` against the
/// staking contract's authoritative `userInfo` view (spec §4.E).
pub struct AlloyUserInfoReader<P: Provider + Clone> {
    client: ChainClient<P>,
    staking_contract: AlloyAddress,
}

impl<P: Provider + Clone> AlloyUserInfoReader<P> {
    pub fn new(client: ChainClient<P>, staking_contract: AlloyAddress) -> Self {
        Self {
            client,
            staking_contract,
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> UserInfoReader for AlloyUserInfoReader<P> {
    async fn user_info(&self, wallet: &Address, pid: Pid) -> Result<BigDecimal> {
        let wallet_addr: AlloyAddress = wallet
            .as_str()
            .parse()
            .map_err(|e| IndexerError::External(format!("bad wallet address {wallet}: {e}")))?;

        let contract = IMasterGardener::new(self.staking_contract, self.client.provider().clone());
        let info = contract
            .userInfo(alloy::primitives::U256::from(pid as u64), wallet_addr)
            .call()
            .await
            .map_err(|e| IndexerError::External(format!("userInfo call failed: {e}")))?;

        info.amount
            .to_string()
            .parse()
            .map_err(|_| IndexerError::External("userInfo amount not representable as decimal".into()))
    }
}

/// Companion feed for the off-chain details the hunt/tournament/marketplace
/// indexers need beyond what their contract events carry. One base URL,
/// three read-only endpoints; the game backend this talks to is out of
/// scope here (spec §1) — this crate only consumes it.
pub struct GameApiReader {
    http: reqwest::Client,
    base_url: String,
}

impl GameApiReader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        self.http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| IndexerError::External(format!("GET {path} failed: {e}")))?
            .error_for_status()
            .map_err(|e| IndexerError::External(format!("GET {path} returned error status: {e}")))?
            .json::<T>()
            .await
            .map_err(|e| IndexerError::External(format!("GET {path} body decode failed: {e}")))
    }
}

#[derive(Deserialize)]
struct ListingsResponse {
    listings: Vec<ListingDto>,
}

#[derive(Deserialize)]
struct ListingDto {
    listing_id: String,
    seller: String,
    asset_id: String,
    price: BigDecimal,
}

#[derive(Deserialize)]
struct SoldResponse {
    sold: bool,
}

#[async_trait]
impl PartySnapshotReader for GameApiReader {
    async fn party_luck(&self, wallet: &Address, tx_hash: &TxHash) -> Result<PartyLuckSnapshot> {
        self.get_json(&format!(
            "/encounters/{}/party?wallet={}",
            tx_hash.as_str(),
            wallet.as_str()
        ))
        .await
    }
}

#[async_trait]
impl HeroStatsReader for GameApiReader {
    async fn hero_stats(&self, hero_id: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("/heroes/{hero_id}/stats")).await
    }
}

#[async_trait]
impl ListingsReader for GameApiReader {
    async fn current_listings(&self) -> Result<Vec<TavernListingSnapshot>> {
        let resp: ListingsResponse = self.get_json("/tavern/listings").await?;
        Ok(resp
            .listings
            .into_iter()
            .map(|dto| TavernListingSnapshot {
                listing_id: dto.listing_id,
                seller: Address::new(dto.seller),
                asset_id: dto.asset_id,
                price: dto.price,
            })
            .collect())
    }

    async fn was_sold(&self, listing_id: &str) -> Result<bool> {
        let resp: SoldResponse = self.get_json(&format!("/tavern/listings/{listing_id}/sold")).await?;
        Ok(resp.sold)
    }
}
