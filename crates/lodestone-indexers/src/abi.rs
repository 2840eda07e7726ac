//! Minimal event ABIs for the contracts this fleet watches. Each indexer
//! only needs the event signature to build its `Filter` and decode logs —
//! not a full contract binding.

use alloy::sol;

sol! {
    event Deposit(address indexed user, uint256 indexed pid, uint256 amount);
    event Withdraw(address indexed user, uint256 indexed pid, uint256 amount);
    event EmergencyWithdraw(address indexed user, uint256 indexed pid, uint256 amount);
    event RewardCollected(address indexed user, uint256 indexed pid, uint256 amount);

    event Swap(
        address indexed sender,
        uint256 amount0In,
        uint256 amount1In,
        uint256 amount0Out,
        uint256 amount1Out,
        address indexed to
    );

    event BridgeDeposit(address indexed wallet, address indexed token, uint256 amount, uint256 assetId, uint256 dstChainId);
    event BridgeWithdraw(address indexed wallet, address indexed token, uint256 amount, uint256 assetId, uint256 srcChainId);

    event Transfer(address indexed from, address indexed to, uint256 value);

    event HuntReward(address indexed wallet, uint256 itemId, uint256 quantity);

    event TournamentResult(uint256 indexed tournamentId, address indexed wallet, uint256 heroId, uint256 placement);

    function userInfo(uint256 pid, address user) external view returns (uint256 amount, uint256 rewardDebt);
    function pendingRewards(uint256 pid, address user) external view returns (uint256);
    function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
}
