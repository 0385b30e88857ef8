//! The approve, permit, swap sequence as a pure state machine.
//!
//! [`transition`] never performs I/O. It returns the [`Command`] the caller
//! has to carry out next and the caller feeds the outcome back in as an
//! [`Event`].

use {
    super::{
        eth::{self, TxHash, U256},
        swap::Kind,
    },
    std::time::Duration,
};

/// Allowances of the swapping account, as seen at a point in time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Allowances {
    /// ERC20 allowance granted to the permission registry.
    pub token: U256,
    /// Delegated allowance granted to the router, zero once expired.
    pub permit: U256,
}

impl Allowances {
    /// The first approval that is insufficient for `amount`, if any.
    pub fn missing(&self, amount: U256) -> Option<Kind> {
        if self.token < amount {
            Some(Kind::ApproveToken)
        } else if self.permit < amount {
            Some(Kind::ApprovePermit)
        } else {
            None
        }
    }
}

/// The raw delegated allowance record stored by the permission registry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PermitAllowance {
    pub amount: U256,
    /// Seconds since the epoch.
    pub expiration: u64,
    pub nonce: u64,
}

impl PermitAllowance {
    /// The amount that can still be spent at `now`.
    pub fn effective(&self, now: u64) -> U256 {
        if now > self.expiration {
            U256::ZERO
        } else {
            self.amount
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Waiting for the approval transaction to be confirmed.
    Pending,
    /// Confirmed, waiting for fresh allowances.
    Refreshing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum State {
    Idle,
    Approving {
        amount: U256,
        step: Kind,
        phase: Phase,
    },
    Swapping {
        amount: U256,
    },
    Success {
        tx: TxHash,
    },
    Error {
        reason: String,
    },
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Approving {
                step: Kind::ApproveToken,
                ..
            } => "approving_token",
            Self::Approving { .. } => "approving_permit",
            Self::Swapping { .. } => "swapping",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The user submitted a swap of `amount`.
    Submit {
        amount: U256,
        allowances: Allowances,
    },
    /// A transaction of the given kind was mined successfully.
    Confirmed { kind: Kind, tx: TxHash },
    /// Allowances were read again.
    Refreshed(Allowances),
    /// Submitting, confirming or reading failed, or the user rejected.
    Failed { reason: String },
    /// The success or error display time is over.
    DisplayElapsed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Approve { step: Kind, amount: U256 },
    RefreshAllowances,
    Swap { amount: U256 },
    /// Emit [`Event::DisplayElapsed`] after the delay.
    ResetAfter(Duration),
}

/// How long terminal states are shown before returning to idle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisplayDelays {
    pub success: Duration,
    pub error: Duration,
}

impl Default for DisplayDelays {
    fn default() -> Self {
        Self {
            success: Duration::from_secs(3),
            error: Duration::from_secs(5),
        }
    }
}

/// Computes the state following `event`. Events that do not apply to the
/// current state leave it unchanged, which is also how a second submission
/// during a running flow gets dropped.
pub fn transition(
    state: &State,
    event: Event,
    delays: &DisplayDelays,
) -> (State, Option<Command>) {
    match (state, event) {
        (State::Idle, Event::Submit { amount, allowances }) => {
            begin(amount, allowances, None, delays)
        }
        (
            State::Approving {
                amount,
                step,
                phase: Phase::Pending,
            },
            Event::Confirmed { kind, .. },
        ) if kind == *step => (
            State::Approving {
                amount: *amount,
                step: *step,
                phase: Phase::Refreshing,
            },
            Some(Command::RefreshAllowances),
        ),
        (
            State::Approving {
                amount,
                step,
                phase: Phase::Refreshing,
            },
            Event::Refreshed(allowances),
        ) => begin(*amount, allowances, Some(*step), delays),
        (State::Swapping { .. }, Event::Confirmed { kind: Kind::Swap, tx }) => (
            State::Success { tx },
            Some(Command::ResetAfter(delays.success)),
        ),
        (
            State::Idle | State::Approving { .. } | State::Swapping { .. },
            Event::Failed { reason },
        ) => fail(&reason, delays),
        (State::Success { .. } | State::Error { .. }, Event::DisplayElapsed) => (State::Idle, None),
        (state, _) => (state.clone(), None),
    }
}

/// Picks the next step for `amount` given fresh allowances. Steps only ever
/// move forward: an approval that is still missing after it was confirmed
/// fails the flow instead of being requested again.
fn begin(
    amount: U256,
    allowances: Allowances,
    confirmed: Option<Kind>,
    delays: &DisplayDelays,
) -> (State, Option<Command>) {
    match allowances.missing(amount) {
        Some(step) if confirmed.is_some_and(|confirmed| step <= confirmed) => {
            fail(&format!("allowance still insufficient after {step:?}"), delays)
        }
        Some(step) => (
            State::Approving {
                amount,
                step,
                phase: Phase::Pending,
            },
            Some(Command::Approve { step, amount }),
        ),
        None => (State::Swapping { amount }, Some(Command::Swap { amount })),
    }
}

fn fail(reason: &str, delays: &DisplayDelays) -> (State, Option<Command>) {
    (
        State::Error {
            reason: eth::truncate_reason(reason),
        },
        Some(Command::ResetAfter(delays.error)),
    )
}

/// Owns the current [`State`] and applies events to it.
#[derive(Debug)]
pub struct Flow {
    state: State,
    delays: DisplayDelays,
}

impl Flow {
    pub fn new(delays: DisplayDelays) -> Self {
        Self {
            state: State::Idle,
            delays,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Drops whatever the flow was doing and goes back to idle.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Applies `event` and returns the previous state along with the command
    /// to run next.
    pub fn apply(&mut self, event: Event) -> (State, Option<Command>) {
        let (mut next, command) = transition(&self.state, event, &self.delays);
        std::mem::swap(&mut self.state, &mut next);
        (next, command)
    }
}
