//! Single commands: a command header plus at most one extension header.

use cqc_proto::{
    CommandHeader, CommunicationHeader, ExtensionKind, Header, Instruction, Options,
    QubitRefHeader, RotationHeader,
};

use crate::error::{Error, Result};
use crate::qubit::{QubitId, RemoteApp};

/// Extension header carried by a full command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Extension {
    /// Remote party of SEND / EPR.
    Communication(CommunicationHeader),
    /// Angle of ROT_X / ROT_Y / ROT_Z.
    Rotation(RotationHeader),
    /// Target qubit of CNOT / CPHASE.
    QubitRef(QubitRefHeader),
}

impl Extension {
    /// Which extension this is.
    pub const fn kind(&self) -> ExtensionKind {
        match self {
            Self::Communication(_) => ExtensionKind::Communication,
            Self::Rotation(_) => ExtensionKind::Rotation,
            Self::QubitRef(_) => ExtensionKind::QubitRef,
        }
    }

    /// Encoded length in bytes.
    pub const fn encoded_len(&self) -> usize {
        self.kind().encoded_len()
    }

    /// Appends the encoded extension to `out`.
    fn put(&self, out: &mut Vec<u8>) {
        match self {
            Self::Communication(h) => h.put(out),
            Self::Rotation(h) => h.put(out),
            Self::QubitRef(h) => h.put(out),
        }
    }
}

/// One instruction addressed to one qubit.
///
/// # Example
///
/// ```
/// use cqc::{Command, Instruction, Options, QubitId};
///
/// let cmd = Command::new(Instruction::H, QubitId::new(3)).options(Options::NOTIFY);
/// assert_eq!(cmd.encoded_len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Command {
    /// Command header.
    header: CommandHeader,
    /// Extension header, for instructions that take one.
    extension: Option<Extension>,
}

impl Command {
    /// A command without extension and without options.
    pub const fn new(instruction: Instruction, qubit: QubitId) -> Self {
        Self {
            header: CommandHeader {
                qubit_id: qubit.get(),
                instruction,
                options: Options::empty(),
            },
            extension: None,
        }
    }

    /// A rotation by `step` × 2π/256 around the axis of `instruction`.
    pub const fn rotation(instruction: Instruction, qubit: QubitId, step: u8) -> Self {
        Self::new(instruction, qubit).extension(Extension::Rotation(RotationHeader { step }))
    }

    /// A two-qubit gate with `control` as control and `target` as target.
    ///
    /// BLOCK is set so a dependent follow-up cannot race completion.
    pub const fn two_qubit(instruction: Instruction, control: QubitId, target: QubitId) -> Self {
        Self::new(instruction, control)
            .extension(Extension::QubitRef(QubitRefHeader {
                qubit_id: target.get(),
            }))
            .options(Options::BLOCK)
    }

    /// A SEND or EPR command addressed to `remote`.
    pub fn remote(instruction: Instruction, qubit: QubitId, remote: RemoteApp) -> Self {
        Self::new(instruction, qubit).extension(Extension::Communication(remote.to_header()))
    }

    /// Replaces the option bits.
    pub const fn options(mut self, options: Options) -> Self {
        self.header.options = options;
        self
    }

    /// Attaches an extension header.
    pub const fn extension(mut self, extension: Extension) -> Self {
        self.extension = Some(extension);
        self
    }

    /// The command header as it goes on the wire.
    pub const fn header(&self) -> CommandHeader {
        self.header
    }

    /// The instruction of this command.
    pub const fn instruction(&self) -> Instruction {
        self.header.instruction
    }

    /// Encoded length of the command header plus extension.
    pub const fn encoded_len(&self) -> usize {
        CommandHeader::LEN
            + match &self.extension {
                Some(ext) => ext.encoded_len(),
                None => 0,
            }
    }

    /// Checks that the extension matches the instruction.
    pub fn validate(&self) -> Result<()> {
        let want = self.header.instruction.extension();
        let have = self.extension.as_ref().map(Extension::kind);
        if want == have {
            Ok(())
        } else {
            Err(Error::InvalidCommand(format!(
                "{} takes {want:?} extension, got {have:?}",
                self.header.instruction
            )))
        }
    }

    /// Appends the command header and extension to `out`.
    pub(crate) fn put(&self, out: &mut Vec<u8>) {
        self.header.put(out);
        if let Some(ext) = &self.extension {
            ext.put(out);
        }
    }
}
