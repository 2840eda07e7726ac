//! On-chain [`PendingRewardsReader`](crate::wallet_rewards::PendingRewardsReader):
//! answers `getWalletRewards` with a live `pendingRewards` `eth_call`,
//! mirroring `lodestone_indexers::readers::AlloyUserInfoReader`'s shape.

use crate::error::Result;
use crate::wallet_rewards::PendingRewardsReader;
use alloy::primitives::Address as AlloyAddress;
use alloy::providers::Provider;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use lodestone_chain::error::ChainError;
use lodestone_chain::ChainClient;
use lodestone_types::ids::{Address, Pid};

alloy::sol! {
    #[sol(rpc)]
    interface IMasterGardenerRewards {
        function pendingRewards(uint256 pid, address user) external view returns (uint256);
    }
}

pub struct AlloyPendingRewardsReader<P: Provider + Clone> {
    client: ChainClient<P>,
    staking_contract: AlloyAddress,
}

impl<P: Provider + Clone> AlloyPendingRewardsReader<P> {
    pub fn new(client: ChainClient<P>, staking_contract: AlloyAddress) -> Self {
        Self {
            client,
            staking_contract,
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> PendingRewardsReader for AlloyPendingRewardsReader<P> {
    async fn pending_rewards(&self, wallet: &Address, pid: Pid) -> Result<BigDecimal> {
        let wallet_addr: AlloyAddress = wallet
            .as_str()
            .parse()
            .map_err(|e| ChainError::Decode(format!("bad wallet address {wallet}: {e}")))?;

        let contract = IMasterGardenerRewards::new(self.staking_contract, self.client.provider().clone());
        let pending = contract
            .pendingRewards(alloy::primitives::U256::from(pid as u64), wallet_addr)
            .call()
            .await
            .map_err(|e| ChainError::Rpc {
                range: 0..0,
                cause: e.to_string(),
            })?;

        pending
            .to_string()
            .parse()
            .map_err(|_| ChainError::Decode("pendingRewards not representable as decimal".into()).into())
    }
}
