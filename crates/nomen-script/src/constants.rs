use bitcoin::opcodes::Opcode;
use bitcoin::opcodes::all::{OP_PUSHNUM_1, OP_PUSHNUM_2};

/// Opcode tagging the registration of a new name.
pub const OP_NAME_REGISTER: Opcode = OP_PUSHNUM_1;

/// Opcode tagging the update of an existing name.
pub const OP_NAME_UPDATE: Opcode = OP_PUSHNUM_2;

pub const WITNESS_V0_SCRIPTHASH_SIZE: usize = 32;
pub const WITNESS_V0_KEYHASH_SIZE: usize = 20;

/// A witness program script is a version byte, a direct push opcode and 2 to 40
/// bytes of program.
pub const MIN_WITNESS_PROGRAM_SCRIPT_SIZE: usize = 4;
pub const MAX_WITNESS_PROGRAM_SCRIPT_SIZE: usize = 42;
