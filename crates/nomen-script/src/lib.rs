//! Name operation scripts.
//!
//! A name operation is carried by an ordinary transaction output whose script is
//! prefixed with the operation, the name and its value:
//!
//! ```text
//! OP_NAME_REGISTER <name> <value> OP_2DROP OP_DROP <address script>
//! OP_NAME_UPDATE   <name> <value> OP_2DROP OP_DROP <address script>
//! ```
//!
//! The prefix leaves the stack untouched, so the output is spent exactly like the
//! wrapped address script. The name opcodes share their numeric values with the
//! small integer pushes used as segwit version bytes, which is why witness program
//! detection in this crate takes an explicit `allow_names` flag.

mod constants;
mod error;
mod name_script;
mod witness;


pub use self::constants::{
    MAX_WITNESS_PROGRAM_SCRIPT_SIZE, MIN_WITNESS_PROGRAM_SCRIPT_SIZE, OP_NAME_REGISTER,
    OP_NAME_UPDATE, WITNESS_V0_KEYHASH_SIZE, WITNESS_V0_SCRIPTHASH_SIZE,
};
pub use self::error::Error;
pub use self::name_script::{NameOp, NameScript};
pub use self::witness::{WitnessProgram, is_p2wpkh, is_p2wsh, witness_program};
