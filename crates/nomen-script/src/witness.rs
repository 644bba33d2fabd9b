use crate::constants::{
    MAX_WITNESS_PROGRAM_SCRIPT_SIZE, MIN_WITNESS_PROGRAM_SCRIPT_SIZE, WITNESS_V0_KEYHASH_SIZE,
    WITNESS_V0_SCRIPTHASH_SIZE,
};
use crate::name_script::NameScript;
use bitcoin::Script;
use bitcoin::opcodes::all::{OP_PUSHBYTES_0, OP_PUSHNUM_1, OP_PUSHNUM_16};

/// Version and program of a segregated witness output script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessProgram {
    /// Witness version, 0 to 16.
    pub version: u8,
    /// Witness program, 2 to 40 bytes.
    pub program: Vec<u8>,
}

/// Classifies `script` as a witness program.
///
/// With `allow_names` set, a name prefix is stripped and the wrapped address is
/// classified instead. Without it, any script carrying a name prefix is rejected, so
/// callers unaware of names never mistake a name output for a plain witness output.
pub fn witness_program(script: &Script, allow_names: bool) -> Option<WitnessProgram> {
    match NameScript::parse(script) {
        Some(name_script) if allow_names => witness_program(name_script.address(), false),
        Some(_) => None,
        None => plain_witness_program(script.as_bytes()),
    }
}

/// Returns `true` if `script` is a version 0 pay-to-witness-script-hash output.
pub fn is_p2wsh(script: &Script, allow_names: bool) -> bool {
    witness_program(script, allow_names).is_some_and(|wp| {
        wp.version == 0 && wp.program.len() == WITNESS_V0_SCRIPTHASH_SIZE
    })
}

/// Returns `true` if `script` is a version 0 pay-to-witness-pubkey-hash output.
pub fn is_p2wpkh(script: &Script, allow_names: bool) -> bool {
    witness_program(script, allow_names)
        .is_some_and(|wp| wp.version == 0 && wp.program.len() == WITNESS_V0_KEYHASH_SIZE)
}

// The program must be pushed with a direct push opcode: the second byte is the
// program length, OP_PUSHDATA* encodings never match.
fn plain_witness_program(bytes: &[u8]) -> Option<WitnessProgram> {
    if !(MIN_WITNESS_PROGRAM_SCRIPT_SIZE..=MAX_WITNESS_PROGRAM_SCRIPT_SIZE).contains(&bytes.len()) {
        return None;
    }

    let version = decode_witness_version(bytes[0])?;

    if bytes[1] as usize + 2 != bytes.len() {
        return None;
    }

    Some(WitnessProgram {
        version,
        program: bytes[2..].to_vec(),
    })
}

fn decode_witness_version(byte: u8) -> Option<u8> {
    if byte == OP_PUSHBYTES_0.to_u8() {
        Some(0)
    } else if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&byte) {
        Some(byte - OP_PUSHNUM_1.to_u8() + 1)
    } else {
        None
    }
}
