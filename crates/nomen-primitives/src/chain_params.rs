use bitcoin::{Amount, Network};
use std::num::NonZeroU32;

/// Height-dependent consensus rules consulted by the name layer.
pub trait ConsensusRules {
    /// Minimum amount locked in a name output confirmed at `height`.
    ///
    /// Name outputs below this amount are rejected as "greedy".
    fn min_name_coin_amount(&self, height: u32) -> Amount;
}

/// Policy for the full name database audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckNameDb {
    /// Never audit.
    #[default]
    Never,
    /// Audit after every block connect and disconnect.
    Always,
    /// Audit after connecting blocks whose height is a multiple of the interval.
    EveryNBlocks(NonZeroU32),
}

impl CheckNameDb {
    /// Interprets the integer `-checknamedb` option: negative disables the audit,
    /// `0` runs it always and `n > 0` runs it every `n` blocks.
    pub fn from_option(option: i64) -> Self {
        match option {
            i64::MIN..=-1 => Self::Never,
            0 => Self::Always,
            n => {
                let interval = u32::try_from(n).unwrap_or(u32::MAX);
                NonZeroU32::new(interval).map_or(Self::Always, Self::EveryNBlocks)
            }
        }
    }

    /// Whether the audit is due after connecting (or disconnecting) the block at `height`.
    pub fn should_run(&self, height: u32, disconnect: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::EveryNBlocks(interval) => !disconnect && height % interval.get() == 0,
        }
    }
}

/// Name related chain parameters.
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// Network these parameters apply to.
    pub network: Network,
    /// Schedule of `(activation height, minimum amount)` for name outputs, sorted by height.
    pub name_coin_floor: Vec<(u32, Amount)>,
    /// Default policy for the name database audit.
    pub check_name_db: CheckNameDb,
}

impl ChainParams {
    /// Constructs a new instance of [`ChainParams`].
    pub fn new(network: Network) -> Self {
        let check_name_db = match network {
            Network::Regtest => CheckNameDb::Always,
            _ => CheckNameDb::Never,
        };

        Self {
            network,
            name_coin_floor: vec![(0, Amount::from_sat(1_000_000))],
            check_name_db,
        }
    }

    /// Overrides the name coin floor schedule.
    pub fn with_name_coin_floor(mut self, mut schedule: Vec<(u32, Amount)>) -> Self {
        schedule.sort_by_key(|(height, _)| *height);
        self.name_coin_floor = schedule;
        self
    }

    /// Overrides the audit policy.
    pub fn with_check_name_db(mut self, check_name_db: CheckNameDb) -> Self {
        self.check_name_db = check_name_db;
        self
    }
}

impl ConsensusRules for ChainParams {
    fn min_name_coin_amount(&self, height: u32) -> Amount {
        self.name_coin_floor
            .iter()
            .rev()
            .find(|(activation, _)| *activation <= height)
            .map_or(Amount::ZERO, |(_, amount)| *amount)
    }
}
