use bitcoin::{Amount, OutPoint};

/// Reasons for rejecting a transaction's name operation.
///
/// Every variant is a deterministic consensus failure, retrying the same
/// transaction against the same state yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("The name is too long")]
    NameTooLong,
    #[error("The empty namespace is not valid")]
    EmptyNamespace,
    #[error("The namespace must only consist of lower-case letters")]
    InvalidNamespace,
    #[error("The name has no namespace")]
    NoNamespace,
    #[error("Non-printable ASCII characters are not allowed in names")]
    UnprintableAscii,
    #[error("The name is not valid UTF-8")]
    InvalidUtf8,
    #[error("The value is too long")]
    ValueTooLong,
    #[error("The value is not valid JSON")]
    ValueInvalidJson,
    #[error("The value must be a JSON object")]
    ValueNotJsonObject,
    #[error("Failed to fetch input coin {0}")]
    MissingInput(OutPoint),
    #[error("Multiple name inputs")]
    MultipleNameInputs,
    #[error("Multiple name outputs")]
    MultipleNameOutputs,
    #[error("Transaction has name input but no name output")]
    NameInNoNameOut,
    #[error("Greedy name operation: {amount} locked, at least {min} required")]
    Greedy { amount: Amount, min: Amount },
    #[error("NAME_REGISTER with a name input")]
    RegisterWithNameInput,
    #[error("Name update has no previous name input")]
    UpdateWithoutNameInput,
    #[error("Name input for NAME_UPDATE is not an update")]
    UpdateInvalidPrev,
    #[error("NAME_UPDATE name mismatch to name input")]
    UpdateNameMismatch,
    #[error("NAME_UPDATE name does not exist")]
    UpdateNonexistent,
    #[error("NAME_REGISTER on existing name")]
    RegisterExistingName,
    #[error("Coinbase transaction carries a name output")]
    CoinbaseNameOutput,
}

impl NameError {
    /// Stable machine-readable code surfaced to peers and RPC callers.
    pub fn reject_reason(&self) -> &'static str {
        match self {
            Self::NameTooLong => "tx-name-too-long",
            Self::EmptyNamespace => "tx-name-empty-namespace",
            Self::InvalidNamespace => "tx-name-invalid-namespace",
            Self::NoNamespace => "tx-name-no-namespace",
            Self::UnprintableAscii => "tx-name-unprintable-ascii",
            Self::InvalidUtf8 => "tx-name-invalid-utf8",
            Self::ValueTooLong => "tx-value-too-long",
            Self::ValueInvalidJson => "tx-value-invalid-json",
            Self::ValueNotJsonObject => "tx-value-no-json-object",
            Self::MissingInput(_) => "bad-txns-inputs-missingorspent",
            Self::MultipleNameInputs => "tx-multiple-name-inputs",
            Self::MultipleNameOutputs => "tx-multiple-name-outputs",
            Self::NameInNoNameOut => "tx-name-in-no-name-out",
            Self::Greedy { .. } => "tx-name-greedy",
            Self::RegisterWithNameInput => "tx-nameregister-with-name-input",
            Self::UpdateWithoutNameInput => "tx-nameupdate-without-name-input",
            Self::UpdateInvalidPrev => "tx-nameupdate-invalid-prev",
            Self::UpdateNameMismatch => "tx-nameupdate-name-mismatch",
            Self::UpdateNonexistent => "tx-nameupdate-nonexistent",
            Self::RegisterExistingName => "tx-nameregister-existing-name",
            Self::CoinbaseNameOutput => "tx-coinbase-name-output",
        }
    }
}

/// Name consensus error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transaction or block breaks a name rule.
    #[error("Invalid name operation: {0}")]
    Invalid(#[from] NameError),
    /// Reading or writing the coin and name state failed.
    #[error(transparent)]
    State(#[from] nomen_state::Error),
    /// The name database disagrees with the coin set.
    ///
    /// Never caused by transaction data, only by a bug elsewhere.
    #[error("Name database inconsistency: {0}")]
    Inconsistent(String),
}

impl Error {
    /// Returns the reject code if this is a validation failure.
    pub fn reject_reason(&self) -> Option<&'static str> {
        match self {
            Self::Invalid(err) => Some(err.reject_reason()),
            Self::State(_) | Self::Inconsistent(_) => None,
        }
    }

    /// Build an inconsistency error.
    ///
    /// # Panics
    ///
    /// Panics in debug builds.
    pub(crate) fn inconsistent(message: String) -> Self {
        tracing::error!(target: crate::LOG_TARGET, "{message}");
        if cfg!(debug_assertions) {
            panic!("{message}");
        }
        Self::Inconsistent(message)
    }
}
