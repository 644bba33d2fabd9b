use clap::Parser;
use nomen_primitives::{ChainParams, CheckNameDb};

/// Name database parameters.
#[derive(Debug, Clone, Parser)]
pub struct NameDbParams {
    /// Audit the name database against the UTXO set.
    ///
    /// `-1` disables the audit, `0` runs it after every connected and disconnected
    /// block and `N` runs it after every connected block whose height is a multiple
    /// of `N`. Defaults to the network's policy.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub check_name_db: Option<i64>,
}

impl NameDbParams {
    /// Resolve the audit policy, falling back to the default of `chain_params`.
    pub fn check_name_db(&self, chain_params: &ChainParams) -> CheckNameDb {
        self.check_name_db
            .map_or(chain_params.check_name_db, CheckNameDb::from_option)
    }
}
