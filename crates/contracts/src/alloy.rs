pub mod networks {
    pub const BASE: u64 = 8453;
    pub const BASE_SEPOLIA: u64 = 84532;
}

#[macro_export]
macro_rules! bindings {
    ($contract:ident { $($body:tt)* } $(, $deployment_info:expr)?) => {
        paste::paste! {
            // Generate the main bindings in a private module. That allows
            // us to re-export all items in our own module while also adding
            // some items ourselves.
            #[allow(non_snake_case)]
            mod [<$contract Private>] {
                alloy::sol! {
                    #[allow(missing_docs)]
                    #[sol(rpc)]
                    interface $contract {
                        $($body)*
                    }
                }
            }

            #[allow(non_snake_case)]
            pub mod $contract {
                use alloy::providers::DynProvider;

                pub use super::[<$contract Private>]::*;
                pub type Instance = $contract::[<$contract Instance>]<DynProvider>;

                $(
                use {
                    std::{sync::LazyLock, collections::HashMap},
                    alloy::primitives::{address, Address},
                    $crate::alloy::networks::*,
                };

                pub static DEPLOYMENT_INFO: LazyLock<HashMap<u64, Address>> = LazyLock::new(|| {
                    $deployment_info
                });

                /// Returns the canonical deployment of the contract on the
                /// given chain, if there is one.
                pub fn deployment(chain_id: u64) -> Option<Address> {
                    DEPLOYMENT_INFO.get(&chain_id).copied()
                }
                )*
            }
        }
    };
}

crate::bindings!(ERC20 {
    function approve(address spender, uint256 amount) external returns (bool);
    function allowance(address owner, address spender) external view returns (uint256);
});

crate::bindings!(
    Permit2 {
        function approve(address token, address spender, uint160 amount, uint48 expiration) external;
        function allowance(address user, address token, address spender)
            external
            view
            returns (uint160 amount, uint48 expiration, uint48 nonce);
    },
    maplit::hashmap! {
        BASE => address!("0x000000000022D473030F116dDEE9F6B43aC78BA3"),
        BASE_SEPOLIA => address!("0x000000000022D473030F116dDEE9F6B43aC78BA3"),
    }
);

crate::bindings!(
    UniversalRouter {
        function execute(bytes commands, bytes[] inputs, uint256 deadline) external payable;
    },
    maplit::hashmap! {
        BASE => address!("0x6ff5693b99212da76ad316178a184ab56d299b43"),
    }
);

crate::bindings!(DynamicFeeHook {
    event DynamicFeeApplied(bytes32 indexed poolId, uint256 swapSize, uint24 feeApplied, uint256 timestamp);

    function getFeeForSize(uint256 size) external pure returns (uint24 fee);
    function getFeeTiers() external pure returns (uint24[4] fees, uint256[3] thresholds);
});

/// Parameter types understood by the Uniswap V4 router actions. These are
/// only ever ABI encoded, never called directly.
#[allow(non_snake_case)]
pub mod V4Router {
    alloy::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct PoolKey {
            address currency0;
            address currency1;
            uint24 fee;
            int24 tickSpacing;
            address hooks;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ExactInputSingleParams {
            PoolKey poolKey;
            bool zeroForOne;
            uint128 amountIn;
            uint128 amountOutMinimum;
            bytes hookData;
        }
    }
}
