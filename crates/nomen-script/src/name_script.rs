use crate::Error;
use crate::constants::{OP_NAME_REGISTER, OP_NAME_UPDATE};
use bitcoin::opcodes::Opcode;
use bitcoin::opcodes::all::{OP_2DROP, OP_DROP, OP_NOP};
use bitcoin::script::{Builder, Instruction, PushBytes};
use bitcoin::{Script, ScriptBuf};

/// Kind of a name operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameOp {
    /// Registers a name that does not exist yet.
    Register,
    /// Updates the value of an existing name, spending its previous name output.
    Update,
}

impl NameOp {
    /// Returns the opcode tagging this operation.
    pub fn opcode(self) -> Opcode {
        match self {
            Self::Register => OP_NAME_REGISTER,
            Self::Update => OP_NAME_UPDATE,
        }
    }

    /// Returns the operation tagged by `opcode`, if any.
    pub fn from_opcode(opcode: Opcode) -> Option<Self> {
        if opcode == OP_NAME_REGISTER {
            Some(Self::Register)
        } else if opcode == OP_NAME_UPDATE {
            Some(Self::Update)
        } else {
            None
        }
    }

    /// Whether the operation sets a value and leaves a name output that can be updated.
    ///
    /// All operations of this protocol do.
    pub fn is_any_update(self) -> bool {
        matches!(self, Self::Register | Self::Update)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "NAME_REGISTER",
            Self::Update => "NAME_UPDATE",
        }
    }
}

impl std::fmt::Display for NameOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded name operation together with the address script it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameScript {
    op: NameOp,
    name: Vec<u8>,
    value: Vec<u8>,
    address: ScriptBuf,
}

fn is_drop(opcode: Opcode) -> bool {
    opcode == OP_DROP || opcode == OP_2DROP || opcode == OP_NOP
}

impl NameScript {
    /// Decodes the name operation at the start of `script`.
    ///
    /// Returns `None` for scripts that do not carry a well-formed name prefix:
    /// the first opcode must be a name opcode, followed by exactly two data pushes
    /// terminated by `OP_DROP`, `OP_2DROP` or `OP_NOP`. Everything after the
    /// terminator, or after `OP_2DROP OP_DROP`, is the address script.
    pub fn parse(script: &Script) -> Option<Self> {
        let mut instructions = script.instruction_indices();

        let op = match instructions.next()? {
            Ok((_, Instruction::Op(opcode))) => NameOp::from_opcode(opcode)?,
            _ => return None,
        };

        let mut args = Vec::with_capacity(2);
        let (terminator, mut address_start) = loop {
            match instructions.next()? {
                Ok((_, Instruction::PushBytes(data))) => args.push(data.as_bytes().to_vec()),
                // Drop opcodes are a single byte.
                Ok((index, Instruction::Op(opcode))) if is_drop(opcode) => {
                    break (opcode, index + 1);
                }
                // Small integers, other opcodes and malformed pushes.
                _ => return None,
            }
        };

        // Only the `OP_2DROP OP_DROP` pair emitted by `build` belongs to the prefix, any
        // further drop opcode is part of the address script.
        if terminator == OP_2DROP {
            if let Some(Ok((index, Instruction::Op(opcode)))) = instructions.next() {
                if opcode == OP_DROP {
                    address_start = index + 1;
                }
            }
        }

        let [name, value]: [Vec<u8>; 2] = args.try_into().ok()?;

        Some(Self {
            op,
            name,
            value,
            address: ScriptBuf::from_bytes(script.as_bytes()[address_start..].to_vec()),
        })
    }

    /// Returns `true` if `script` carries a well-formed name prefix.
    pub fn is_name_op(script: &Script) -> bool {
        Self::parse(script).is_some()
    }

    pub fn name_op(&self) -> NameOp {
        self.op
    }

    pub fn op_name(&self) -> &[u8] {
        &self.name
    }

    pub fn op_value(&self) -> &[u8] {
        &self.value
    }

    /// The spendable script wrapped by the name prefix.
    pub fn address(&self) -> &Script {
        &self.address
    }

    pub fn is_any_update(&self) -> bool {
        self.op.is_any_update()
    }

    /// Wraps `address` into a name operation prefix.
    pub fn build(
        op: NameOp,
        address: &Script,
        name: &[u8],
        value: &[u8],
    ) -> Result<ScriptBuf, Error> {
        let name_push: &PushBytes = name.try_into().map_err(|_| Error::PushSize(name.len()))?;
        let value_push: &PushBytes = value
            .try_into()
            .map_err(|_| Error::PushSize(value.len()))?;

        let mut bytes = Builder::new()
            .push_opcode(op.opcode())
            .push_slice(name_push)
            .push_slice(value_push)
            .push_opcode(OP_2DROP)
            .push_opcode(OP_DROP)
            .into_script()
            .into_bytes();
        bytes.extend_from_slice(address.as_bytes());

        Ok(ScriptBuf::from_bytes(bytes))
    }

    /// Builds a `NAME_REGISTER` script wrapping `address`.
    pub fn build_name_register(
        address: &Script,
        name: &[u8],
        value: &[u8],
    ) -> Result<ScriptBuf, Error> {
        Self::build(NameOp::Register, address, name, value)
    }

    /// Builds a `NAME_UPDATE` script wrapping `address`.
    pub fn build_name_update(
        address: &Script,
        name: &[u8],
        value: &[u8],
    ) -> Result<ScriptBuf, Error> {
        Self::build(NameOp::Update, address, name, value)
    }
}
