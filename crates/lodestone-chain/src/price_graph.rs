//! Price graph builder (spec §4.C): BFS-propagated USD pricing network
//! anchored at a stablecoin, derived from LP reserves.

use bigdecimal::{BigDecimal, Zero};
use lodestone_types::ids::Address;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::info;

/// One LP pool's reserves, decimal-normalized token descriptors.
#[derive(Debug, Clone)]
pub struct PoolReserves {
    pub pool_address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: BigDecimal,
    pub reserve1: BigDecimal,
    pub decimals0: i16,
    pub decimals1: i16,
}

impl PoolReserves {
    fn has_liquidity(&self) -> bool {
        !self.reserve0.is_zero() && !self.reserve1.is_zero()
    }

    /// Decimal-normalized `reserve_a / reserve_b` rate from `from` to `to`.
    fn rate(&self, from: &Address, to: &Address) -> Option<BigDecimal> {
        let ten = BigDecimal::from(10);
        if from == &self.token0 && to == &self.token1 {
            let norm0 = &self.reserve0 / ten.clone().pow(self.decimals0 as u64);
            let norm1 = &self.reserve1 / ten.pow(self.decimals1 as u64);
            if norm1.is_zero() {
                return None;
            }
            Some(norm0 / norm1)
        } else if from == &self.token1 && to == &self.token0 {
            let norm0 = &self.reserve0 / ten.clone().pow(self.decimals0 as u64);
            let norm1 = &self.reserve1 / ten.pow(self.decimals1 as u64);
            if norm0.is_zero() {
                return None;
            }
            Some(norm1 / norm0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
struct Edge {
    to: Address,
    pool: Address,
}

/// Builds the undirected adjacency list, inserting priority pairs at the
/// front of each list so BFS prefers trusted direct-stable edges (spec
/// §4.C "priority-pair" bullet).
pub struct PriceGraphBuilder {
    anchor: Address,
    priority_pairs: HashSet<(Address, Address)>,
}

#[derive(Debug, Clone, Default)]
pub struct PriceGraphResult {
    pub prices: HashMap<Address, BigDecimal>,
}

impl PriceGraphResult {
    pub fn price_of(&self, token: &Address) -> Option<&BigDecimal> {
        self.prices.get(token)
    }
}

impl PriceGraphBuilder {
    pub fn new(anchor: Address) -> Self {
        Self {
            anchor,
            priority_pairs: HashSet::new(),
        }
    }

    /// Register a priority-pair edge: when present, BFS visits it before
    /// any other edge from the same node.
    pub fn with_priority_pair(mut self, a: Address, b: Address) -> Self {
        self.priority_pairs.insert((a.clone(), b.clone()));
        self.priority_pairs.insert((b, a));
        self
    }

    /// Pure BFS over the pools passed in. Empty-reserve pools contribute no
    /// edges (spec §8 boundary behavior). First path wins, per BFS
    /// insertion order — this is deterministic and avoids arbitrage-loop
    /// amplification by construction (spec §4.C rationale).
    pub fn build(&self, pools: &[PoolReserves]) -> PriceGraphResult {
        let mut adjacency: HashMap<Address, Vec<Edge>> = HashMap::new();

        for pool in pools {
            if !pool.has_liquidity() {
                continue;
            }
            self.push_edge(&mut adjacency, &pool.token0, &pool.token1, &pool.pool_address);
            self.push_edge(&mut adjacency, &pool.token1, &pool.token0, &pool.pool_address);
        }

        let pool_by_address: HashMap<&Address, &PoolReserves> =
            pools.iter().map(|p| (&p.pool_address, p)).collect();

        let mut prices: HashMap<Address, BigDecimal> = HashMap::new();
        prices.insert(self.anchor.clone(), BigDecimal::from(1));

        let mut visited: HashSet<Address> = HashSet::new();
        visited.insert(self.anchor.clone());

        let mut queue: VecDeque<Address> = VecDeque::new();
        queue.push_back(self.anchor.clone());

        while let Some(current) = queue.pop_front() {
            let current_price = prices.get(&current).cloned().unwrap_or_else(|| BigDecimal::from(0));
            let Some(edges) = adjacency.get(&current) else {
                continue;
            };

            for edge in edges {
                if visited.contains(&edge.to) {
                    continue;
                }
                let Some(pool) = pool_by_address.get(&edge.pool) else {
                    continue;
                };
                let Some(rate) = pool.rate(&current, &edge.to) else {
                    continue;
                };

                let price = &current_price * &rate;
                prices.insert(edge.to.clone(), price);
                visited.insert(edge.to.clone());
                queue.push_back(edge.to.clone());
            }
        }

        info!(
            anchor = %self.anchor,
            priced_tokens = prices.len(),
            "price graph BFS complete"
        );

        PriceGraphResult { prices }
    }

    fn push_edge(&self, adjacency: &mut HashMap<Address, Vec<Edge>>, from: &Address, to: &Address, pool: &Address) {
        let list = adjacency.entry(from.clone()).or_default();
        let edge = Edge {
            to: to.clone(),
            pool: pool.clone(),
        };
        if self.priority_pairs.contains(&(from.clone(), to.clone())) {
            list.insert(0, edge);
        } else {
            list.push(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    /// Spec §8 end-to-end scenario 2: anchor=USDC($1); USDC-JEWEL (100,50)
    /// => JEWEL=$2.00; JEWEL-CRYSTAL (200,800) => CRYSTAL=$0.50; an
    /// unreachable token stays unpriced.
    #[test]
    fn bfs_propagates_prices_from_anchor() {
        let usdc = addr("usdc");
        let jewel = addr("jewel");
        let crystal = addr("crystal");
        let orphan = addr("orphan");

        let pools = vec![
            PoolReserves {
                pool_address: addr("pool-usdc-jewel"),
                token0: usdc.clone(),
                token1: jewel.clone(),
                reserve0: BigDecimal::from(100),
                reserve1: BigDecimal::from(50),
                decimals0: 0,
                decimals1: 0,
            },
            PoolReserves {
                pool_address: addr("pool-jewel-crystal"),
                token0: jewel.clone(),
                token1: crystal.clone(),
                reserve0: BigDecimal::from(200),
                reserve1: BigDecimal::from(800),
                decimals0: 0,
                decimals1: 0,
            },
        ];

        let result = PriceGraphBuilder::new(usdc.clone()).build(&pools);

        assert_eq!(result.price_of(&usdc), Some(&BigDecimal::from(1)));
        assert_eq!(result.price_of(&jewel), Some(&BigDecimal::from(2)));
        assert_eq!(
            result.price_of(&crystal),
            Some(&"0.5".parse::<BigDecimal>().unwrap())
        );
        assert_eq!(result.price_of(&orphan), None);
    }

    #[test]
    fn empty_reserve_pools_contribute_no_edges() {
        let usdc = addr("usdc");
        let jewel = addr("jewel");

        let pools = vec![PoolReserves {
            pool_address: addr("pool-usdc-jewel"),
            token0: usdc.clone(),
            token1: jewel.clone(),
            reserve0: BigDecimal::from(0),
            reserve1: BigDecimal::from(50),
            decimals0: 0,
            decimals1: 0,
        }];

        let result = PriceGraphBuilder::new(usdc.clone()).build(&pools);
        assert_eq!(result.prices.len(), 1);
        assert_eq!(result.price_of(&jewel), None);
    }

    #[test]
    fn priority_pair_is_preferred_when_a_shorter_path_exists_too() {
        // anchor - A directly (priority) and anchor - B - A (longer path);
        // first-path-wins with priority insertion means the direct edge
        // determines A's price, not the longer path.
        let anchor = addr("anchor");
        let a = addr("a");
        let b = addr("b");

        let pools = vec![
            PoolReserves {
                pool_address: addr("pool-anchor-b"),
                token0: anchor.clone(),
                token1: b.clone(),
                reserve0: BigDecimal::from(1),
                reserve1: BigDecimal::from(1),
                decimals0: 0,
                decimals1: 0,
            },
            PoolReserves {
                pool_address: addr("pool-b-a"),
                token0: b.clone(),
                token1: a.clone(),
                reserve0: BigDecimal::from(1),
                reserve1: BigDecimal::from(5),
                decimals0: 0,
                decimals1: 0,
            },
            PoolReserves {
                pool_address: addr("pool-anchor-a"),
                token0: anchor.clone(),
                token1: a.clone(),
                reserve0: BigDecimal::from(1),
                reserve1: BigDecimal::from(2),
                decimals0: 0,
                decimals1: 0,
            },
        ];

        let result = PriceGraphBuilder::new(anchor.clone())
            .with_priority_pair(anchor.clone(), a.clone())
            .build(&pools);

        // Direct pool anchor-a (1, 2) prices a at 0.5; the longer anchor-b-a
        // path would price it at 0.2. The priority edge must win.
        assert_eq!(result.price_of(&a), Some(&"0.5".parse::<BigDecimal>().unwrap()));
    }
}
