use {
    super::{
        eth::{Address, B256},
        fee::MAX_FEE,
    },
    alloy::{
        primitives::{
            aliases::{I24, U24},
            keccak256,
        },
        sol_types::SolValue,
    },
    contracts::alloy::V4Router,
    std::fmt::{self, Display, Formatter},
    thiserror::Error,
};

/// Fee value marking a pool whose fee is decided by its hook on every swap.
pub const DYNAMIC_FEE_FLAG: u32 = 0x80_0000;

/// Largest tick spacing a V4 pool can be initialized with.
pub const MAX_TICK_SPACING: i32 = 32_767;

/// Keccak hash of the ABI encoded pool key. Identifies a pool on the pool
/// manager and in the hook's events.
pub type PoolId = B256;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum InvalidPool {
    #[error("native currency is not supported")]
    NativeCurrency,
    #[error("currency0 {0} must sort before currency1 {1}")]
    UnsortedCurrencies(Address, Address),
    #[error("fee {0:#x} is neither a static fee nor the dynamic fee flag")]
    Fee(u32),
    #[error("tick spacing {0} is out of range")]
    TickSpacing(i32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Currency {
    pub address: Address,
    pub decimals: u8,
}

/// Which way a swap goes through the pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Sells currency0 for currency1.
    ZeroForOne,
    /// Sells currency1 for currency0.
    OneForZero,
}

impl Direction {
    pub fn zero_for_one(self) -> bool {
        matches!(self, Self::ZeroForOne)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZeroForOne => "zero-for-one",
            Self::OneForZero => "one-for-zero",
        })
    }
}

/// The pool swaps are routed through. Its key is validated on construction
/// so it can always be encoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    currency0: Currency,
    currency1: Currency,
    key: V4Router::PoolKey,
}

impl Pool {
    pub fn new(
        currency0: Currency,
        currency1: Currency,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Result<Self, InvalidPool> {
        if currency0.address.is_zero() || currency1.address.is_zero() {
            return Err(InvalidPool::NativeCurrency);
        }
        if currency0.address >= currency1.address {
            return Err(InvalidPool::UnsortedCurrencies(
                currency0.address,
                currency1.address,
            ));
        }
        if fee != DYNAMIC_FEE_FLAG && fee > MAX_FEE {
            return Err(InvalidPool::Fee(fee));
        }
        if !(1..=MAX_TICK_SPACING).contains(&tick_spacing) {
            return Err(InvalidPool::TickSpacing(tick_spacing));
        }
        let tick_spacing =
            I24::try_from(tick_spacing).map_err(|_| InvalidPool::TickSpacing(tick_spacing))?;

        Ok(Self {
            currency0,
            currency1,
            key: V4Router::PoolKey {
                currency0: currency0.address,
                currency1: currency1.address,
                // In range, checked above.
                fee: U24::from(fee),
                tickSpacing: tick_spacing,
                hooks,
            },
        })
    }

    pub fn key(&self) -> &V4Router::PoolKey {
        &self.key
    }

    pub fn id(&self) -> PoolId {
        keccak256(self.key.abi_encode())
    }

    pub fn hooks(&self) -> Address {
        self.key.hooks
    }

    pub fn is_dynamic(&self) -> bool {
        self.key.fee == U24::from(DYNAMIC_FEE_FLAG)
    }

    /// The currency sold when swapping in `direction`.
    pub fn input(&self, direction: Direction) -> Currency {
        match direction {
            Direction::ZeroForOne => self.currency0,
            Direction::OneForZero => self.currency1,
        }
    }

    /// The currency bought when swapping in `direction`.
    pub fn output(&self, direction: Direction) -> Currency {
        match direction {
            Direction::ZeroForOne => self.currency1,
            Direction::OneForZero => self.currency0,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use {
        super::*,
        alloy::primitives::{U256, address},
    };

    pub fn currency(address: Address) -> Currency {
        Currency {
            address,
            decimals: 18,
        }
    }

    pub fn pool() -> Pool {
        Pool::new(
            currency(address!("0x1111111111111111111111111111111111111111")),
            currency(address!("0x2222222222222222222222222222222222222222")),
            DYNAMIC_FEE_FLAG,
            60,
            address!("0x3333333333333333333333333333333333333333"),
        )
        .unwrap()
    }

    fn word(value: U256) -> [u8; 32] {
        value.to_be_bytes()
    }

    #[test]
    fn pool_id_hashes_the_encoded_key() {
        let pool = pool();
        let mut encoded = Vec::new();
        encoded.extend_from_slice(pool.key().currency0.into_word().as_slice());
        encoded.extend_from_slice(pool.key().currency1.into_word().as_slice());
        encoded.extend_from_slice(&word(U256::from(DYNAMIC_FEE_FLAG)));
        encoded.extend_from_slice(&word(U256::from(60)));
        encoded.extend_from_slice(pool.hooks().into_word().as_slice());

        assert_eq!(pool.key().abi_encode(), encoded);
        assert_eq!(pool.id(), keccak256(&encoded));
        assert!(pool.is_dynamic());
    }

    #[test]
    fn negative_tick_spacing_is_rejected() {
        let pool = pool();
        let (c0, c1) = (pool.input(Direction::ZeroForOne), pool.output(Direction::ZeroForOne));
        assert_eq!(
            Pool::new(c0, c1, DYNAMIC_FEE_FLAG, -1, Address::ZERO),
            Err(InvalidPool::TickSpacing(-1))
        );
        assert_eq!(
            Pool::new(c0, c1, DYNAMIC_FEE_FLAG, MAX_TICK_SPACING + 1, Address::ZERO),
            Err(InvalidPool::TickSpacing(MAX_TICK_SPACING + 1))
        );
    }

    #[test]
    fn currencies_must_be_sorted_erc20s() {
        let pool = pool();
        let (c0, c1) = (pool.input(Direction::ZeroForOne), pool.output(Direction::ZeroForOne));
        assert_eq!(
            Pool::new(c1, c0, 3000, 60, Address::ZERO),
            Err(InvalidPool::UnsortedCurrencies(c1.address, c0.address))
        );
        assert_eq!(
            Pool::new(currency(Address::ZERO), c1, 3000, 60, Address::ZERO),
            Err(InvalidPool::NativeCurrency)
        );
        assert_eq!(
            Pool::new(c0, c1, 0x90_0000, 60, Address::ZERO),
            Err(InvalidPool::Fee(0x90_0000))
        );
        assert!(!Pool::new(c0, c1, 3000, 60, Address::ZERO)
            .unwrap()
            .is_dynamic());
    }

    #[test]
    fn direction_selects_input_and_output() {
        let pool = pool();
        assert_eq!(
            pool.input(Direction::OneForZero),
            pool.output(Direction::ZeroForOne)
        );
        assert!(Direction::ZeroForOne.zero_for_one());
        assert!(!Direction::OneForZero.zero_for_one());
    }
}
