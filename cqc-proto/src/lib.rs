//! Wire format of the CQC protocol between a classical controller and a
//! quantum network backend.
//!
//! Every message is a [`ProtocolHeader`] followed by `length` bytes of
//! further fixed-size headers. All integers are big-endian and no header
//! carries padding beyond its documented fields.

mod codec;
mod header;
mod message;

pub use codec::{MAX_HEADER_LEN, decode, encode};
pub use header::{
    CommandHeader, CommunicationHeader, EntanglementInfoHeader, FactoryHeader, Header,
    MeasurementOutcomeHeader, ProtocolHeader, QubitRefHeader, RotationHeader, SequenceHeader,
    TimeInfoHeader,
};
pub use message::{
    CQC_VERSION, DEFAULT_PORT, ErrorCode, ExtensionKind, Instruction, MessageType, Options,
};
