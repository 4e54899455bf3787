//! Message types, instructions, backend error codes, and command options.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Protocol revision spoken by this crate.
pub const CQC_VERSION: u8 = 2;

/// Default TCP port of a CQC backend.
pub const DEFAULT_PORT: u16 = 8803;

/// Declares a `u8`-backed wire enum with `TryFrom<u8>` and a display name.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $code,
            )+
        }

        impl $name {
            /// Returns the wire code.
            pub const fn code(self) -> u8 {
                self as u8
            }

            /// Returns the protocol name, as used in logs and error messages.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = io::Error;

            fn try_from(code: u8) -> io::Result<Self> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(concat!("unknown ", stringify!($name), " code {}"), code),
                    )),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(v: $name) -> Self {
                v.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

wire_enum! {
    /// Control type carried in every [`ProtocolHeader`](crate::ProtocolHeader).
    ///
    /// Codes at or above [`MessageType::ERROR_THRESHOLD`] are error replies.
    #[non_exhaustive]
    pub enum MessageType {
        /// Alive check.
        Hello = 0 => "HELLO",
        /// Execute a command list.
        Command = 1 => "COMMAND",
        /// Execute a command repeatedly.
        Factory = 2 => "FACTORY",
        /// A qubit has expired.
        Expire = 3 => "EXPIRE",
        /// Command execution done.
        Done = 4 => "DONE",
        /// Qubit received.
        Recv = 5 => "RECV",
        /// EPR pair created.
        EprOk = 6 => "EPR_OK",
        /// Measurement outcome.
        MeasOut = 7 => "MEASOUT",
        /// Ask for the creation time of a qubit.
        GetTime = 8 => "GET_TIME",
        /// Creation time of a qubit.
        InfTime = 9 => "INF_TIME",
        /// New qubit created.
        NewOk = 10 => "NEW_OK",
        /// General purpose error.
        ErrGeneral = 20 => "ERR_GENERAL",
        /// No more qubits available.
        ErrNoQubit = 21 => "ERR_NOQUBIT",
        /// Command sequence not supported.
        ErrUnsupported = 22 => "ERR_UNSUPP",
        /// Backend timed out.
        ErrTimeout = 23 => "ERR_TIMEOUT",
        /// Qubit already in use.
        ErrInUse = 24 => "ERR_INUSE",
        /// Unknown qubit id.
        ErrUnknownQubit = 25 => "ERR_UNKNOWN",
    }
}

impl MessageType {
    /// Lowest code used for error replies.
    pub const ERROR_THRESHOLD: u8 = 20;

    /// Returns `true` for error reply types.
    pub const fn is_error(self) -> bool {
        self.code() >= Self::ERROR_THRESHOLD
    }

    /// Maps an error reply type to its [`ErrorCode`].
    pub const fn error_code(self) -> Option<ErrorCode> {
        match self {
            Self::ErrGeneral => Some(ErrorCode::General),
            Self::ErrNoQubit => Some(ErrorCode::NoQubit),
            Self::ErrUnsupported => Some(ErrorCode::Unsupported),
            Self::ErrTimeout => Some(ErrorCode::Timeout),
            Self::ErrInUse => Some(ErrorCode::InUse),
            Self::ErrUnknownQubit => Some(ErrorCode::UnknownQubit),
            _ => None,
        }
    }
}

/// Kind of an explicit error reply from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCode {
    /// General error without details.
    General,
    /// No more qubits available.
    NoQubit,
    /// Command not supported.
    Unsupported,
    /// Backend timed out waiting for a remote party.
    Timeout,
    /// Qubit already in use.
    InUse,
    /// Unknown qubit id.
    UnknownQubit,
}

impl ErrorCode {
    /// Returns the reply type carrying this error.
    pub const fn message_type(self) -> MessageType {
        match self {
            Self::General => MessageType::ErrGeneral,
            Self::NoQubit => MessageType::ErrNoQubit,
            Self::Unsupported => MessageType::ErrUnsupported,
            Self::Timeout => MessageType::ErrTimeout,
            Self::InUse => MessageType::ErrInUse,
            Self::UnknownQubit => MessageType::ErrUnknownQubit,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::General => "general error",
            Self::NoQubit => "no more qubits available",
            Self::Unsupported => "command not supported",
            Self::Timeout => "timeout",
            Self::InUse => "qubit already in use",
            Self::UnknownQubit => "unknown qubit id",
        })
    }
}

wire_enum! {
    /// Instruction carried in a [`CommandHeader`](crate::CommandHeader).
    #[non_exhaustive]
    pub enum Instruction {
        /// Identity; wait one step.
        I = 0 => "I",
        /// Allocate a new qubit.
        New = 1 => "NEW",
        /// Measure and release a qubit.
        Measure = 2 => "MEASURE",
        /// Measure a qubit, keeping it allocated.
        MeasureInplace = 3 => "MEASURE_INPLACE",
        /// Reset a qubit to |0>.
        Reset = 4 => "RESET",
        /// Send a qubit to a remote node.
        Send = 5 => "SEND",
        /// Receive a qubit.
        Recv = 6 => "RECV",
        /// Create an EPR pair with a remote node.
        Epr = 7 => "EPR",
        /// Receive half of an EPR pair.
        EprRecv = 8 => "EPR_RECV",
        /// Pauli X.
        X = 10 => "X",
        /// Pauli Z.
        Z = 11 => "Z",
        /// Pauli Y.
        Y = 12 => "Y",
        /// T gate.
        T = 13 => "T",
        /// Rotation around X in steps of 2π/256.
        RotX = 14 => "ROT_X",
        /// Rotation around Y in steps of 2π/256.
        RotY = 15 => "ROT_Y",
        /// Rotation around Z in steps of 2π/256.
        RotZ = 16 => "ROT_Z",
        /// Hadamard gate.
        H = 17 => "H",
        /// K gate, taking the computational basis to the Y eigenbasis.
        K = 18 => "K",
        /// CNOT with this qubit as control.
        Cnot = 20 => "CNOT",
        /// CPHASE with this qubit as control.
        Cphase = 21 => "CPHASE",
    }
}

/// Extension header a full command of a given instruction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtensionKind {
    /// [`CommunicationHeader`](crate::CommunicationHeader).
    Communication,
    /// [`RotationHeader`](crate::RotationHeader).
    Rotation,
    /// [`QubitRefHeader`](crate::QubitRefHeader).
    QubitRef,
}

impl ExtensionKind {
    /// Encoded length of this extension header.
    pub const fn encoded_len(self) -> usize {
        use crate::header::{CommunicationHeader, Header, QubitRefHeader, RotationHeader};
        match self {
            Self::Communication => CommunicationHeader::LEN,
            Self::Rotation => RotationHeader::LEN,
            Self::QubitRef => QubitRefHeader::LEN,
        }
    }
}

impl Instruction {
    /// Returns the extension header this instruction requires, if any.
    pub const fn extension(self) -> Option<ExtensionKind> {
        match self {
            Self::Send | Self::Epr => Some(ExtensionKind::Communication),
            Self::RotX | Self::RotY | Self::RotZ => Some(ExtensionKind::Rotation),
            Self::Cnot | Self::Cphase => Some(ExtensionKind::QubitRef),
            _ => None,
        }
    }

    /// Returns `true` for two-qubit gates.
    pub const fn is_two_qubit(self) -> bool {
        matches!(self, Self::Cnot | Self::Cphase)
    }
}

bitflags::bitflags! {
    /// Option bits of a [`CommandHeader`](crate::CommandHeader) or
    /// [`FactoryHeader`](crate::FactoryHeader).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Options: u8 {
        /// Send a DONE notification when the command completes.
        const NOTIFY = 0x01;
        /// Chained commands follow in a sequence header.
        const ACTION = 0x02;
        /// Suspend local processing until the command completes.
        const BLOCK = 0x04;
        /// Execute depending on a previous measurement outcome.
        const IFTHEN = 0x08;
    }
}
