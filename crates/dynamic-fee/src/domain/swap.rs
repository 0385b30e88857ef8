//! Transactions the client sends: token approvals, delegated allowances and
//! Universal Router swaps.

use {
    super::{
        eth::{Address, Bytes, EncodedInteraction, U256},
        pool::{Direction, Pool},
    },
    alloy::{
        primitives::aliases::{U48, U160},
        sol_types::{SolCall, SolValue},
    },
    contracts::alloy::{ERC20, Permit2, UniversalRouter, V4Router},
    std::time::Duration,
    thiserror::Error,
};

/// Universal Router command bytes.
pub mod commands {
    pub const V4_SWAP: u8 = 0x10;
}

/// V4 router action bytes, executed in order within a single `V4_SWAP`
/// command.
pub mod actions {
    pub const SWAP_EXACT_IN_SINGLE: u8 = 0x06;
    pub const SETTLE_ALL: u8 = 0x0c;
    pub const TAKE_ALL: u8 = 0x0f;
}

const MAX_U48: u64 = (1 << 48) - 1;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum EncodingError {
    #[error("swap amount must be positive")]
    ZeroAmount,
    #[error("{0} does not fit into 128 bits")]
    AmountTooLarge(U256),
    #[error("permit amount {0} does not fit into 160 bits")]
    PermitTooLarge(U256),
}

/// A swap the user asked for, sized in base units of the input currency.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub direction: Direction,
    pub amount_in: U256,
    pub min_amount_out: U256,
}

impl Request {
    pub fn new(
        direction: Direction,
        amount_in: U256,
        min_amount_out: U256,
    ) -> Result<Self, EncodingError> {
        if amount_in.is_zero() {
            return Err(EncodingError::ZeroAmount);
        }
        to_u128(amount_in)?;
        to_u128(min_amount_out)?;
        Ok(Self {
            direction,
            amount_in,
            min_amount_out,
        })
    }

    /// The token that needs allowances for this swap.
    pub fn token(&self, pool: &Pool) -> Address {
        pool.input(self.direction).address
    }
}

/// Arguments for `UniversalRouter.execute`, minus the deadline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouterCall {
    pub commands: Bytes,
    pub inputs: Vec<Bytes>,
}

fn to_u128(amount: U256) -> Result<u128, EncodingError> {
    u128::try_from(amount).map_err(|_| EncodingError::AmountTooLarge(amount))
}

/// Encodes an exact input single hop swap as a single `V4_SWAP` command:
/// swap, then settle the full input, then take at least `min_amount_out`.
pub fn encode_v4_swap(
    pool: &Pool,
    zero_for_one: bool,
    amount_in: U256,
    min_amount_out: U256,
) -> Result<RouterCall, EncodingError> {
    let direction = if zero_for_one {
        Direction::ZeroForOne
    } else {
        Direction::OneForZero
    };
    let actions = Bytes::from(vec![
        actions::SWAP_EXACT_IN_SINGLE,
        actions::SETTLE_ALL,
        actions::TAKE_ALL,
    ]);

    let swap = V4Router::ExactInputSingleParams {
        poolKey: pool.key().clone(),
        zeroForOne: zero_for_one,
        amountIn: to_u128(amount_in)?,
        amountOutMinimum: to_u128(min_amount_out)?,
        hookData: Bytes::new(),
    }
    .abi_encode();
    let settle = (pool.input(direction).address, amount_in).abi_encode_params();
    let take = (pool.output(direction).address, min_amount_out).abi_encode_params();

    let params: Vec<Bytes> = vec![swap.into(), settle.into(), take.into()];
    let input = (actions, params).abi_encode_params();

    Ok(RouterCall {
        commands: Bytes::from(vec![commands::V4_SWAP]),
        inputs: vec![input.into()],
    })
}

/// What a transaction is for. Used to match confirmations to the step that
/// is waiting on them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Kind {
    ApproveToken,
    ApprovePermit,
    Swap,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    /// Unlimited ERC20 approval of the permission registry.
    ApproveToken { token: Address, spender: Address },
    /// Delegated allowance for the router, bounded in amount and time.
    ApprovePermit {
        permit2: Address,
        token: Address,
        spender: Address,
        amount: U160,
        expiration: U48,
    },
    Swap {
        router: Address,
        call: RouterCall,
        deadline: U256,
    },
}

impl Instruction {
    pub fn approve_token(token: Address, permit2: Address) -> Self {
        Self::ApproveToken {
            token,
            spender: permit2,
        }
    }

    /// A delegated allowance of exactly `amount` expiring `validity` after
    /// `now` (seconds since the epoch).
    pub fn approve_permit(
        permit2: Address,
        token: Address,
        router: Address,
        amount: U256,
        now: u64,
        validity: Duration,
    ) -> Result<Self, EncodingError> {
        if amount > U256::from(U160::MAX) {
            return Err(EncodingError::PermitTooLarge(amount));
        }
        let expiration = now.saturating_add(validity.as_secs()).min(MAX_U48);
        Ok(Self::ApprovePermit {
            permit2,
            token,
            spender: router,
            amount: U160::from(amount),
            expiration: U48::from(expiration),
        })
    }

    /// An exact input swap through the router that reverts if not mined
    /// within `validity` after `now`.
    pub fn swap(
        router: Address,
        pool: &Pool,
        request: &Request,
        now: u64,
        validity: Duration,
    ) -> Result<Self, EncodingError> {
        Ok(Self::Swap {
            router,
            call: encode_v4_swap(
                pool,
                request.direction.zero_for_one(),
                request.amount_in,
                request.min_amount_out,
            )?,
            deadline: U256::from(now.saturating_add(validity.as_secs())),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::ApproveToken { .. } => Kind::ApproveToken,
            Self::ApprovePermit { .. } => Kind::ApprovePermit,
            Self::Swap { .. } => Kind::Swap,
        }
    }

    pub fn encode(&self) -> EncodedInteraction {
        match self {
            Self::ApproveToken { token, spender } => (
                *token,
                U256::ZERO,
                ERC20::ERC20::approveCall {
                    spender: *spender,
                    amount: U256::MAX,
                }
                .abi_encode()
                .into(),
            ),
            Self::ApprovePermit {
                permit2,
                token,
                spender,
                amount,
                expiration,
            } => (
                *permit2,
                U256::ZERO,
                Permit2::Permit2::approveCall {
                    token: *token,
                    spender: *spender,
                    amount: *amount,
                    expiration: *expiration,
                }
                .abi_encode()
                .into(),
            ),
            Self::Swap {
                router,
                call,
                deadline,
            } => (
                *router,
                U256::ZERO,
                UniversalRouter::UniversalRouter::executeCall {
                    commands: call.commands.clone(),
                    inputs: call.inputs.clone(),
                    deadline: *deadline,
                }
                .abi_encode()
                .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::pool::tests::pool,
        alloy::primitives::{address, utils::parse_ether},
        hex_literal::hex,
    };

    fn words(words: &[[u8; 32]]) -> Vec<u8> {
        words.concat()
    }

    fn address_word(address: Address) -> [u8; 32] {
        address.into_word().0
    }

    fn amount_word(amount: U256) -> [u8; 32] {
        amount.to_be_bytes()
    }

    #[test]
    fn encodes_v4_swap() {
        let pool = pool();
        let amount = parse_ether("0.01").unwrap();
        let min_out = U256::from(1234);
        let call = encode_v4_swap(&pool, true, amount, min_out).unwrap();

        assert_eq!(call.commands, Bytes::from(vec![0x10]));
        assert_eq!(call.inputs.len(), 1);

        let (actions, params) = <(Bytes, Vec<Bytes>)>::abi_decode_params(&call.inputs[0]).unwrap();
        assert_eq!(actions, Bytes::from(vec![0x06, 0x0c, 0x0f]));
        assert_eq!(params.len(), 3);

        let currency0 = pool.key().currency0;
        let currency1 = pool.key().currency1;
        assert_eq!(
            params[1].to_vec(),
            words(&[address_word(currency0), amount_word(amount)])
        );
        assert_eq!(
            params[2].to_vec(),
            words(&[address_word(currency1), amount_word(min_out)])
        );

        // Single dynamic tuple: offset, 5 key words, direction, amounts, then
        // the offset and length of empty hook data.
        let swap = &params[0];
        assert_eq!(swap.len(), 32 * 11);
        assert_eq!(swap[..32], amount_word(U256::from(0x20)));
        assert_eq!(swap[32..192], pool.key().abi_encode());
        assert_eq!(swap[192..224], amount_word(U256::ONE));
        assert_eq!(swap[224..256], amount_word(amount));
        assert_eq!(swap[256..288], amount_word(min_out));
        assert_eq!(swap[288..320], amount_word(U256::from(0xa0 + 0x80)));
        assert_eq!(swap[320..352], amount_word(U256::ZERO));

        let decoded =
            <V4Router::ExactInputSingleParams as SolValue>::abi_decode(swap).unwrap();
        assert_eq!(&decoded.poolKey, pool.key());
        assert!(decoded.zeroForOne);
        assert_eq!(decoded.amountIn, 10_000_000_000_000_000);
    }

    #[test]
    fn one_for_zero_settles_currency1() {
        let pool = pool();
        let call = encode_v4_swap(&pool, false, U256::from(7), U256::ZERO).unwrap();
        let (_, params) = <(Bytes, Vec<Bytes>)>::abi_decode_params(&call.inputs[0]).unwrap();
        assert_eq!(
            params[1].to_vec(),
            words(&[address_word(pool.key().currency1), amount_word(U256::from(7))])
        );
        assert_eq!(
            params[2].to_vec(),
            words(&[address_word(pool.key().currency0), amount_word(U256::ZERO)])
        );
    }

    #[test]
    fn rejects_amounts_beyond_128_bits() {
        let pool = pool();
        let too_large = U256::from(u128::MAX) + U256::ONE;
        assert_eq!(
            encode_v4_swap(&pool, true, too_large, U256::ZERO),
            Err(EncodingError::AmountTooLarge(too_large))
        );
        assert_eq!(
            Request::new(Direction::ZeroForOne, U256::ZERO, U256::ZERO),
            Err(EncodingError::ZeroAmount)
        );
        assert_eq!(
            Request::new(Direction::ZeroForOne, U256::ONE, too_large),
            Err(EncodingError::AmountTooLarge(too_large))
        );
    }

    #[test]
    fn token_approval_is_unlimited() {
        let token = address!("0x1111111111111111111111111111111111111111");
        let permit2 = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");
        let (target, value, calldata) = Instruction::approve_token(token, permit2).encode();
        assert_eq!(target, token);
        assert_eq!(value, U256::ZERO);
        assert_eq!(
            calldata.to_vec(),
            [
                hex!("095ea7b3").as_slice(),
                address_word(permit2).as_slice(),
                amount_word(U256::MAX).as_slice(),
            ]
            .concat()
        );
    }

    #[test]
    fn permit_expires_after_validity() {
        let permit2 = Address::repeat_byte(0x22);
        let token = Address::repeat_byte(0x11);
        let router = Address::repeat_byte(0x44);
        let instruction = Instruction::approve_permit(
            permit2,
            token,
            router,
            U256::from(500),
            1_700_000_000,
            Duration::from_secs(30 * 24 * 60 * 60),
        )
        .unwrap();
        assert_eq!(instruction.kind(), Kind::ApprovePermit);

        let (target, _, calldata) = instruction.encode();
        assert_eq!(target, permit2);
        assert_eq!(
            calldata.to_vec(),
            [
                hex!("87517c45").as_slice(),
                address_word(token).as_slice(),
                address_word(router).as_slice(),
                amount_word(U256::from(500)).as_slice(),
                amount_word(U256::from(1_700_000_000 + 2_592_000)).as_slice(),
            ]
            .concat()
        );

        assert_eq!(
            Instruction::approve_permit(
                permit2,
                token,
                router,
                U256::MAX,
                0,
                Duration::ZERO
            ),
            Err(EncodingError::PermitTooLarge(U256::MAX))
        );
    }

    #[test]
    fn swap_calls_router_with_deadline() {
        let pool = pool();
        let router = Address::repeat_byte(0x44);
        let request = Request::new(Direction::OneForZero, U256::from(10), U256::ONE).unwrap();
        assert_eq!(request.token(&pool), pool.key().currency1);

        let instruction =
            Instruction::swap(router, &pool, &request, 1_000, Duration::from_secs(1800)).unwrap();
        let Instruction::Swap { deadline, .. } = &instruction else {
            panic!("expected swap instruction");
        };
        assert_eq!(*deadline, U256::from(2_800));

        let (target, _, calldata) = instruction.encode();
        assert_eq!(target, router);
        assert_eq!(calldata[..4], hex!("3593564c"));
        let decoded =
            <UniversalRouter::UniversalRouter::executeCall as SolCall>::abi_decode(&calldata)
                .unwrap();
        assert_eq!(decoded.deadline, U256::from(2_800));
        assert_eq!(decoded.commands, Bytes::from(vec![commands::V4_SWAP]));
    }
}
