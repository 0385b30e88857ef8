//! Drives the authorization flow against the chain.

use {
    crate::{
        domain::{
            authorization::{Allowances, Command, DisplayDelays, Event, Flow, State},
            eth::{Address, TxHash},
            pool::Pool,
            swap::{self, Instruction, Kind},
        },
        infra::observe,
        traits::{LedgerRead, LedgerWrite},
    },
    anyhow::{Context, Result},
    std::time::Duration,
};

/// Contracts the flow approves and calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Contracts {
    pub permit2: Address,
    pub router: Address,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    pub display: DisplayDelays,
    /// How long a swap transaction stays valid after it was built.
    pub swap_deadline: Duration,
    /// How long delegated allowances stay valid after they were granted.
    pub permit_expiration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            display: DisplayDelays::default(),
            swap_deadline: Duration::from_secs(30 * 60),
            permit_expiration: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// How a swap attempt ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Swapped { tx: TxHash },
    Failed { reason: String },
}

impl Outcome {
    fn of(state: &State) -> Option<Self> {
        match state {
            State::Success { tx } => Some(Self::Swapped { tx: *tx }),
            State::Error { reason } => Some(Self::Failed {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

pub struct Swapper {
    read: Box<dyn LedgerRead>,
    write: Box<dyn LedgerWrite>,
    owner: Address,
    pool: Pool,
    contracts: Contracts,
    timing: Timing,
    flow: Flow,
}

impl Swapper {
    pub fn new(
        read: Box<dyn LedgerRead>,
        write: Box<dyn LedgerWrite>,
        owner: Address,
        pool: Pool,
        contracts: Contracts,
        timing: Timing,
    ) -> Self {
        Self {
            read,
            write,
            owner,
            pool,
            contracts,
            timing,
            flow: Flow::new(timing.display),
        }
    }

    pub fn state(&self) -> &State {
        self.flow.state()
    }

    /// Runs a swap to completion: approves whatever is missing, swaps, and
    /// holds the terminal state for its display time before going back to
    /// idle.
    pub async fn swap(&mut self, request: &swap::Request) -> Result<Outcome> {
        if !matches!(self.flow.state(), State::Idle) {
            // A previous call was dropped before the flow settled.
            tracing::warn!(state = ?self.flow.state(), "resetting abandoned swap flow");
            self.flow.reset();
        }
        let token = request.token(&self.pool);
        let mut event = match self.allowances(token).await {
            Ok(allowances) => Event::Submit {
                amount: request.amount_in,
                allowances,
            },
            Err(err) => failed(err),
        };

        let mut outcome = None;
        loop {
            let (previous, command) = self.flow.apply(event);
            observe::transition(&previous, self.flow.state());
            let Some(command) = command else {
                break;
            };
            event = match command {
                Command::Approve {
                    step: Kind::ApproveToken,
                    ..
                } => {
                    self.send(Ok(Instruction::approve_token(
                        token,
                        self.contracts.permit2,
                    )))
                    .await
                }
                Command::Approve { amount, .. } => {
                    self.send(Instruction::approve_permit(
                        self.contracts.permit2,
                        token,
                        self.contracts.router,
                        amount,
                        now(),
                        self.timing.permit_expiration,
                    ))
                    .await
                }
                Command::RefreshAllowances => match self.allowances(token).await {
                    Ok(allowances) => Event::Refreshed(allowances),
                    Err(err) => failed(err),
                },
                Command::Swap { .. } => {
                    self.send(Instruction::swap(
                        self.contracts.router,
                        &self.pool,
                        request,
                        now(),
                        self.timing.swap_deadline,
                    ))
                    .await
                }
                Command::ResetAfter(delay) => {
                    tracing::info!(state = ?self.flow.state(), "swap flow finished");
                    outcome = Outcome::of(self.flow.state());
                    tokio::time::sleep(delay).await;
                    Event::DisplayElapsed
                }
            };
        }
        outcome.context("swap flow stopped before reaching a result")
    }

    /// Current allowances for `token`, with expired delegated allowances
    /// counted as zero.
    async fn allowances(&self, token: Address) -> Result<Allowances> {
        let direct = self
            .read
            .token_allowance(self.owner, token, self.contracts.permit2)
            .await
            .context("token allowance")?;
        let permit = self
            .read
            .permit_allowance(self.owner, token, self.contracts.router)
            .await
            .context("permit allowance")?;
        Ok(Allowances {
            token: direct,
            permit: permit.effective(now()),
        })
    }

    async fn send(&self, instruction: Result<Instruction, swap::EncodingError>) -> Event {
        let instruction = match instruction {
            Ok(instruction) => instruction,
            Err(err) => return failed(err),
        };
        let kind = instruction.kind();
        let tx = match self.write.submit(&instruction).await {
            Ok(tx) => tx,
            Err(err) => return failed(err),
        };
        tracing::info!(?kind, ?tx, "submitted transaction");
        match self.write.confirm(tx).await {
            Ok(()) => Event::Confirmed { kind, tx },
            Err(err) => failed(err),
        }
    }
}

fn failed(err: impl Into<anyhow::Error>) -> Event {
    let err = err.into();
    tracing::warn!(?err, "swap flow step failed");
    Event::Failed {
        reason: format!("{err:#}"),
    }
}

fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
