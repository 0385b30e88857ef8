//! Fee tiers of the dynamic fee hook and the mapping from swap sizes to
//! them.

use {
    super::eth::{self, U256},
    std::fmt::{self, Display, Formatter},
    thiserror::Error,
};

/// Decimals of the swap sizes the hook prices. Tier thresholds and the sizes
/// reported in fee events both use this unit, independent of the pool's
/// token decimals.
pub const SIZE_DECIMALS: u8 = 18;

/// Largest fee a V4 pool accepts, i.e. 100% in hundredths of a basis point.
pub const MAX_FEE: u32 = 1_000_000;

/// A single row of the fee schedule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tier {
    /// Fee in hundredths of a basis point (3000 = 0.30%).
    pub fee: u32,
    pub label: String,
    /// Smallest swap size, in units of [`SIZE_DECIMALS`], this tier applies
    /// to.
    pub threshold: U256,
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, eth::format_fee(self.fee))
    }
}

/// How fees evolve as swaps get larger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Monotonicity {
    Increasing,
    Decreasing,
}

impl Monotonicity {
    /// Infers the direction of a fee sequence. Flat sequences count as
    /// decreasing, sequences that change direction have none.
    pub fn infer(fees: &[u32]) -> Option<Self> {
        if Self::Decreasing.holds(fees) {
            Some(Self::Decreasing)
        } else if Self::Increasing.holds(fees) {
            Some(Self::Increasing)
        } else {
            None
        }
    }

    fn holds(self, fees: &[u32]) -> bool {
        fees.windows(2).all(|pair| match self {
            Self::Increasing => pair[0] <= pair[1],
            Self::Decreasing => pair[0] >= pair[1],
        })
    }
}

impl Display for Monotonicity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        })
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum InvalidSchedule {
    #[error("fee schedule has no tiers")]
    Empty,
    #[error("first fee tier starts at {0} instead of zero")]
    FirstThreshold(U256),
    #[error("threshold of fee tier {index} does not exceed the previous one")]
    ThresholdOrder { index: usize },
    #[error("fee {fee} of tier {index} exceeds the maximum of {MAX_FEE}")]
    FeeTooLarge { index: usize, fee: u32 },
    #[error("fee of tier {index} breaks the {monotonicity} fee order")]
    FeeOrder {
        index: usize,
        monotonicity: Monotonicity,
    },
    #[error("fees do not change monotonically with swap size")]
    NotMonotonic,
    #[error("got {fees} fees for {thresholds} tier boundaries")]
    Shape { fees: usize, thresholds: usize },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Mismatch {
    #[error("{local} tiers configured but the hook has {onchain}")]
    TierCount { local: usize, onchain: usize },
    #[error("tier {index} charges {local} locally but {onchain} on chain")]
    Fee {
        index: usize,
        local: u32,
        onchain: u32,
    },
    #[error("tier {index} starts at {local} locally but at {onchain} on chain")]
    Threshold {
        index: usize,
        local: U256,
        onchain: U256,
    },
}

/// An ordered, validated list of fee tiers.
///
/// Thresholds start at zero and are strictly increasing so every swap size
/// maps to exactly one tier. Fees move in a single direction as swap sizes
/// grow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schedule {
    tiers: Vec<Tier>,
    monotonicity: Monotonicity,
}

impl Schedule {
    pub fn new(tiers: Vec<Tier>, monotonicity: Monotonicity) -> Result<Self, InvalidSchedule> {
        let first = tiers.first().ok_or(InvalidSchedule::Empty)?;
        if !first.threshold.is_zero() {
            return Err(InvalidSchedule::FirstThreshold(first.threshold));
        }
        for (index, tier) in tiers.iter().enumerate() {
            if tier.fee > MAX_FEE {
                return Err(InvalidSchedule::FeeTooLarge {
                    index,
                    fee: tier.fee,
                });
            }
        }
        for (index, pair) in tiers.windows(2).enumerate() {
            let index = index + 1;
            if pair[1].threshold <= pair[0].threshold {
                return Err(InvalidSchedule::ThresholdOrder { index });
            }
            if !monotonicity.holds(&[pair[0].fee, pair[1].fee]) {
                return Err(InvalidSchedule::FeeOrder {
                    index,
                    monotonicity,
                });
            }
        }
        Ok(Self {
            tiers,
            monotonicity,
        })
    }

    /// Builds a schedule from the hook's `getFeeTiers` getter. The hook
    /// returns one more fee than it returns boundaries: the first tier
    /// implicitly starts at zero.
    pub fn from_onchain(fees: &[u32], boundaries: &[U256]) -> Result<Self, InvalidSchedule> {
        if fees.len() != boundaries.len() + 1 {
            return Err(InvalidSchedule::Shape {
                fees: fees.len(),
                thresholds: boundaries.len(),
            });
        }
        let monotonicity = Monotonicity::infer(fees).ok_or(InvalidSchedule::NotMonotonic)?;
        let thresholds = std::iter::once(U256::ZERO).chain(boundaries.iter().copied());
        let tiers = fees
            .iter()
            .zip(thresholds)
            .map(|(&fee, threshold)| Tier {
                fee,
                label: eth::format_fee(fee),
                threshold,
            })
            .collect();
        Self::new(tiers, monotonicity)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn monotonicity(&self) -> Monotonicity {
        self.monotonicity
    }

    /// The tier that applies to the smallest swaps.
    pub fn lowest(&self) -> &Tier {
        &self.tiers[0]
    }

    /// Returns the tier with the greatest threshold not exceeding `amount`.
    pub fn resolve(&self, amount: U256) -> &Tier {
        self.tiers
            .iter()
            .rev()
            .find(|tier| amount >= tier.threshold)
            .unwrap_or_else(|| self.lowest())
    }

    /// Resolves a user supplied decimal amount. Input that does not parse
    /// as a non-negative number resolves to the lowest tier.
    pub fn resolve_input(&self, input: &str, decimals: u8) -> &Tier {
        self.resolve(eth::parse_amount(input, decimals))
    }

    /// Checks that fees and thresholds agree with another schedule. Labels
    /// are not compared.
    pub fn verify(&self, onchain: &Schedule) -> Result<(), Mismatch> {
        if self.tiers.len() != onchain.tiers.len() {
            return Err(Mismatch::TierCount {
                local: self.tiers.len(),
                onchain: onchain.tiers.len(),
            });
        }
        for (index, (local, onchain)) in self.tiers.iter().zip(&onchain.tiers).enumerate() {
            if local.fee != onchain.fee {
                return Err(Mismatch::Fee {
                    index,
                    local: local.fee,
                    onchain: onchain.fee,
                });
            }
            if local.threshold != onchain.threshold {
                return Err(Mismatch::Threshold {
                    index,
                    local: local.threshold,
                    onchain: onchain.threshold,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::utils::parse_ether};

    fn tier(fee: u32, label: &str, threshold: &str) -> Tier {
        Tier {
            fee,
            label: label.to_owned(),
            threshold: parse_ether(threshold).unwrap(),
        }
    }

    /// Larger swaps pay less.
    fn volume_discount() -> Schedule {
        Schedule::new(
            vec![
                tier(1000, "Micro", "0"),
                tier(500, "Small", "0.0001"),
                tier(300, "Medium", "0.001"),
                tier(100, "Large", "0.005"),
            ],
            Monotonicity::Decreasing,
        )
        .unwrap()
    }

    /// Larger swaps pay more.
    fn size_premium() -> Schedule {
        Schedule::new(
            vec![
                tier(500, "Small", "0"),
                tier(3000, "Medium", "1"),
                tier(10_000, "Large", "10"),
                tier(30_000, "Whale", "100"),
            ],
            Monotonicity::Increasing,
        )
        .unwrap()
    }

    #[test]
    fn resolves_swap_sizes() {
        let schedule = volume_discount();
        assert_eq!(schedule.resolve_input("0.0005", 18).fee, 500);
        assert_eq!(schedule.resolve_input("0.0005", 18).label, "Small");
        assert_eq!(schedule.resolve_input("0.01", 18).fee, 100);
        assert_eq!(schedule.resolve_input("0.01", 18).label, "Large");

        let schedule = size_premium();
        assert_eq!(schedule.resolve_input("0.5", 18).fee, 500);
        assert_eq!(schedule.resolve_input("5", 18).fee, 3000);
        assert_eq!(schedule.resolve_input("50", 18).fee, 10_000);
        assert_eq!(schedule.resolve_input("5000", 18).fee, 30_000);
    }

    #[test]
    fn resolves_dynamic_fee_pool_tiers() {
        let schedule = Schedule::new(
            vec![
                tier(3000, "Base", "0"),
                tier(1000, "Small", "0.0001"),
                tier(500, "Medium", "0.001"),
                tier(100, "Large", "0.005"),
            ],
            Monotonicity::Decreasing,
        )
        .unwrap();

        let small = schedule.resolve_input("0.0005", 18);
        assert_eq!(small.fee, 1000);
        assert_eq!(small.label, "Small");
        assert_eq!(eth::format_fee(small.fee), "0.10%");

        let large = schedule.resolve_input("0.02", 18);
        assert_eq!(large.fee, 100);
        assert_eq!(large.label, "Large");
        assert_eq!(eth::format_fee(large.fee), "0.01%");
    }

    #[test]
    fn thresholds_are_inclusive() {
        let schedule = volume_discount();
        let boundary = parse_ether("0.001").unwrap();
        assert_eq!(schedule.resolve(boundary).label, "Medium");
        assert_eq!(schedule.resolve(boundary - U256::ONE).label, "Small");
    }

    #[test]
    fn zero_and_garbage_resolve_to_the_lowest_tier() {
        let schedule = volume_discount();
        assert_eq!(schedule.resolve(U256::ZERO), schedule.lowest());
        for input in ["", "abc", "-3", "1..0"] {
            assert_eq!(schedule.resolve_input(input, 18), schedule.lowest());
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let schedule = size_premium();
        let amount = parse_ether("42").unwrap();
        assert_eq!(schedule.resolve(amount), schedule.resolve(amount));
    }

    #[test]
    fn fees_follow_the_declared_direction() {
        let amounts: Vec<U256> = ["0", "0.00005", "0.0001", "0.0009", "0.002", "0.005", "7"]
            .into_iter()
            .map(|amount| parse_ether(amount).unwrap())
            .collect();

        let schedule = volume_discount();
        for pair in amounts.windows(2) {
            assert!(schedule.resolve(pair[0]).fee >= schedule.resolve(pair[1]).fee);
        }
        let schedule = size_premium();
        for pair in amounts.windows(2) {
            assert!(schedule.resolve(pair[0]).fee <= schedule.resolve(pair[1]).fee);
        }
    }

    #[test]
    fn rejects_invalid_schedules() {
        assert_eq!(
            Schedule::new(vec![], Monotonicity::Increasing),
            Err(InvalidSchedule::Empty)
        );
        assert!(matches!(
            Schedule::new(vec![tier(100, "a", "1")], Monotonicity::Increasing),
            Err(InvalidSchedule::FirstThreshold(_))
        ));
        assert_eq!(
            Schedule::new(
                vec![tier(100, "a", "0"), tier(200, "b", "1"), tier(300, "c", "1")],
                Monotonicity::Increasing,
            ),
            Err(InvalidSchedule::ThresholdOrder { index: 2 })
        );
        assert_eq!(
            Schedule::new(
                vec![tier(100, "a", "0"), tier(50, "b", "1")],
                Monotonicity::Increasing,
            ),
            Err(InvalidSchedule::FeeOrder {
                index: 1,
                monotonicity: Monotonicity::Increasing,
            })
        );
        assert_eq!(
            Schedule::new(vec![tier(MAX_FEE + 1, "a", "0")], Monotonicity::Increasing),
            Err(InvalidSchedule::FeeTooLarge {
                index: 0,
                fee: MAX_FEE + 1,
            })
        );
    }

    #[test]
    fn builds_schedule_from_hook_getter() {
        let boundaries = [
            parse_ether("1").unwrap(),
            parse_ether("10").unwrap(),
            parse_ether("100").unwrap(),
        ];
        let schedule = Schedule::from_onchain(&[500, 3000, 10_000, 30_000], &boundaries).unwrap();
        assert_eq!(schedule.monotonicity(), Monotonicity::Increasing);
        assert_eq!(schedule.lowest().label, "0.05%");
        assert_eq!(schedule.tiers()[3].threshold, boundaries[2]);
        assert_eq!(schedule.verify(&size_premium()), Ok(()));

        assert_eq!(
            Schedule::from_onchain(&[500, 3000], &boundaries),
            Err(InvalidSchedule::Shape {
                fees: 2,
                thresholds: 3,
            })
        );
        assert_eq!(
            Schedule::from_onchain(&[500, 3000, 100, 30_000], &boundaries),
            Err(InvalidSchedule::NotMonotonic)
        );
    }

    #[test]
    fn detects_mismatching_schedules() {
        let onchain = Schedule::from_onchain(
            &[500, 3000, 10_000, 30_000],
            &[
                parse_ether("1").unwrap(),
                parse_ether("10").unwrap(),
                parse_ether("50").unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(
            size_premium().verify(&onchain),
            Err(Mismatch::Threshold {
                index: 3,
                local: parse_ether("100").unwrap(),
                onchain: parse_ether("50").unwrap(),
            })
        );
        assert!(matches!(
            size_premium().verify(&volume_discount()),
            Err(Mismatch::Fee { index: 0, .. })
        ));
    }

    #[test]
    fn infers_monotonicity() {
        assert_eq!(
            Monotonicity::infer(&[1, 2, 2, 3]),
            Some(Monotonicity::Increasing)
        );
        assert_eq!(
            Monotonicity::infer(&[3, 2, 1]),
            Some(Monotonicity::Decreasing)
        );
        assert_eq!(Monotonicity::infer(&[1, 3, 2]), None);
    }
}
