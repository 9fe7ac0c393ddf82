//! Solidity bindings for the external contracts the workflow calls.
//!
//! Only the functions the workflow uses are declared; argument and return
//! shapes follow the deployed Aave v2, WETH9 and Chainlink interfaces.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IWeth {
        function deposit() external payable;
        function balanceOf(address owner) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface ILendingPoolAddressesProvider {
        function getLendingPool() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface ILendingPool {
        function deposit(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
        function repay(address asset, uint256 amount, uint256 rateMode, address onBehalfOf) external returns (uint256);
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralETH,
            uint256 totalDebtETH,
            uint256 availableBorrowsETH,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );
    }
}

sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}
