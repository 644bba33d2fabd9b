use bitcoin::{OutPoint, ScriptBuf};
use serde::{Deserialize, Serialize};

/// Maximum size of a single pushed script element.
///
/// Raised from Bitcoin's 520 bytes so that a maximum-size value fits in one push.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 2048;

/// Maximum length of a name in bytes.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of a name's value in bytes.
pub const MAX_VALUE_LENGTH: usize = 2048;

// Names and values are pushed as single script elements; anything larger would
// produce name outputs that can never be spent.
const _: () = assert!(MAX_NAME_LENGTH <= MAX_SCRIPT_ELEMENT_SIZE);
const _: () = assert!(MAX_VALUE_LENGTH <= MAX_SCRIPT_ELEMENT_SIZE);

/// Current on-chain state of a registered name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameData {
    /// Value bound to the name, a serialised JSON object.
    pub value: Vec<u8>,
    /// Height of the block that last registered or updated the name.
    pub height: u32,
    /// Output currently holding the name.
    pub update_outpoint: OutPoint,
    /// Spendable script wrapped by the name prefix of that output.
    pub address: ScriptBuf,
}

impl NameData {
    pub fn new(value: Vec<u8>, height: u32, update_outpoint: OutPoint, address: ScriptBuf) -> Self {
        Self {
            value,
            height,
            update_outpoint,
            address,
        }
    }
}
