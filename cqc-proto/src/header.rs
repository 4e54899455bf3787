//! Fixed-size CQC headers.
//!
//! Every header is serialized field by field in big-endian order, so the
//! encoded length is exactly [`Header::LEN`] on every platform.

use std::io;

use serde::{Deserialize, Serialize};

use crate::message::{CQC_VERSION, Instruction, MessageType, Options};

/// A fixed-size record of the CQC wire format.
pub trait Header: Sized {
    /// Encoded length in bytes.
    const LEN: usize;

    /// Appends the encoded header to `out`.
    fn put(&self, out: &mut Vec<u8>);

    /// Decodes a header from exactly [`Self::LEN`] bytes.
    fn parse(buf: &[u8]) -> io::Result<Self>;

    /// Encodes the header into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        self.put(&mut out);
        out
    }
}

/// Big-endian field reader over a header-sized slice.
struct Fields<'a>(&'a [u8]);

impl<'a> Fields<'a> {
    /// Checks that `buf` holds exactly `len` bytes.
    fn new(buf: &'a [u8], len: usize, what: &str) -> io::Result<Self> {
        if buf.len() == len {
            Ok(Self(buf))
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{what} needs {len} bytes, got {}", buf.len()),
            ))
        }
    }

    /// Takes the next `N` bytes.
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let (head, rest) = self
            .0
            .split_first_chunk::<N>()
            .map_or(([0; N], &[][..]), |(h, r)| (*h, r));
        self.0 = rest;
        head
    }

    /// Reads a `u8`.
    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    /// Reads a big-endian `u16`.
    fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.take())
    }

    /// Reads a big-endian `u32`.
    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    /// Reads a big-endian `u64`.
    fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.take())
    }
}

/// Leading header of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolHeader {
    /// Protocol version.
    pub version: u8,
    /// Control type.
    pub msg_type: MessageType,
    /// Application id the message belongs to.
    pub app_id: u16,
    /// Byte length of all headers following this one in the same message.
    pub length: u32,
}

impl ProtocolHeader {
    /// Creates a header for the current protocol version.
    pub const fn new(msg_type: MessageType, app_id: u16, length: u32) -> Self {
        Self {
            version: CQC_VERSION,
            msg_type,
            app_id,
            length,
        }
    }
}

impl Header for ProtocolHeader {
    const LEN: usize = 8;

    fn put(&self, out: &mut Vec<u8>) {
        out.push(self.version);
        out.push(self.msg_type.code());
        out.extend_from_slice(&self.app_id.to_be_bytes());
        out.extend_from_slice(&self.length.to_be_bytes());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "protocol header")?;
        let version = f.u8();
        let msg_type = MessageType::try_from(f.u8())?;
        Ok(Self {
            version,
            msg_type,
            app_id: f.u16(),
            length: f.u32(),
        })
    }
}

/// Instruction applied to one qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Qubit the instruction targets.
    pub qubit_id: u16,
    /// Instruction to execute.
    pub instruction: Instruction,
    /// Execution options.
    pub options: Options,
}

impl Header for CommandHeader {
    const LEN: usize = 4;

    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.qubit_id.to_be_bytes());
        out.push(self.instruction.code());
        out.push(self.options.bits());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "command header")?;
        let qubit_id = f.u16();
        let instruction = Instruction::try_from(f.u8())?;
        Ok(Self {
            qubit_id,
            instruction,
            options: Options::from_bits_retain(f.u8()),
        })
    }
}

/// Remote party of SEND and EPR commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationHeader {
    /// Application id on the remote node.
    pub remote_app_id: u16,
    /// Classical control port of the remote node.
    pub remote_port: u16,
    /// IPv4 address of the remote node.
    pub remote_node: u32,
}

impl Header for CommunicationHeader {
    const LEN: usize = 8;

    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.remote_app_id.to_be_bytes());
        out.extend_from_slice(&self.remote_port.to_be_bytes());
        out.extend_from_slice(&self.remote_node.to_be_bytes());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "communication header")?;
        Ok(Self {
            remote_app_id: f.u16(),
            remote_port: f.u16(),
            remote_node: f.u32(),
        })
    }
}

/// Angle of a rotation gate, in steps of 2π/256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationHeader {
    /// Number of angle steps.
    pub step: u8,
}

impl Header for RotationHeader {
    const LEN: usize = 1;

    fn put(&self, out: &mut Vec<u8>) {
        out.push(self.step);
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "rotation header")?;
        Ok(Self { step: f.u8() })
    }
}

/// A second qubit id: the target of a two-qubit gate, or the qubit a
/// NEW_OK / RECV / EPR_OK reply refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitRefHeader {
    /// Referenced qubit.
    pub qubit_id: u16,
}

impl Header for QubitRefHeader {
    const LEN: usize = 2;

    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.qubit_id.to_be_bytes());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "qubit header")?;
        Ok(Self { qubit_id: f.u16() })
    }
}

/// Repeat count of a FACTORY message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryHeader {
    /// Number of times the command is executed.
    pub iterations: u8,
    /// Only [`Options::NOTIFY`] and [`Options::BLOCK`] are meaningful.
    pub options: Options,
}

impl Header for FactoryHeader {
    const LEN: usize = 2;

    fn put(&self, out: &mut Vec<u8>) {
        out.push(self.iterations);
        out.push(self.options.bits());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "factory header")?;
        Ok(Self {
            iterations: f.u8(),
            options: Options::from_bits_retain(f.u8()),
        })
    }
}

/// Byte length of the commands chained after an ACTION command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceHeader {
    /// Length of the remaining commands in bytes.
    pub cmd_length: u8,
}

impl Header for SequenceHeader {
    const LEN: usize = 1;

    fn put(&self, out: &mut Vec<u8>) {
        out.push(self.cmd_length);
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "sequence header")?;
        Ok(Self {
            cmd_length: f.u8(),
        })
    }
}

/// Body of a MEASOUT reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementOutcomeHeader {
    /// Measured bit.
    pub outcome: u8,
}

impl Header for MeasurementOutcomeHeader {
    const LEN: usize = 1;

    fn put(&self, out: &mut Vec<u8>) {
        out.push(self.outcome);
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "measurement outcome header")?;
        Ok(Self { outcome: f.u8() })
    }
}

/// Body of an INF_TIME reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfoHeader {
    /// Creation time of the qubit.
    pub timestamp: u64,
}

impl Header for TimeInfoHeader {
    const LEN: usize = 8;

    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.timestamp.to_be_bytes());
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "time info header")?;
        Ok(Self {
            timestamp: f.u64(),
        })
    }
}

/// Entanglement information returned with EPR_OK.
///
/// The entanglement id together with both endpoints and the directionality
/// flag identifies a pair uniquely in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntanglementInfoHeader {
    /// Address of the creating node.
    pub node_a: u32,
    /// Port of the creating node.
    pub port_a: u16,
    /// Application id on the creating node.
    pub app_id_a: u16,
    /// Address of the other node.
    pub node_b: u32,
    /// Port of the other node.
    pub port_b: u16,
    /// Application id on the other node.
    pub app_id_b: u16,
    /// Entanglement id, incremented per node pair and direction.
    pub entanglement_id: u32,
    /// Creation time.
    pub timestamp: u64,
    /// Time at which `goodness` was estimated.
    pub goodness_time: u64,
    /// Goodness estimate of the pair.
    pub goodness: u16,
    /// Which side initiated creation.
    pub directionality: u8,
}

impl Header for EntanglementInfoHeader {
    const LEN: usize = 40;

    fn put(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.node_a.to_be_bytes());
        out.extend_from_slice(&self.port_a.to_be_bytes());
        out.extend_from_slice(&self.app_id_a.to_be_bytes());
        out.extend_from_slice(&self.node_b.to_be_bytes());
        out.extend_from_slice(&self.port_b.to_be_bytes());
        out.extend_from_slice(&self.app_id_b.to_be_bytes());
        out.extend_from_slice(&self.entanglement_id.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.goodness_time.to_be_bytes());
        out.extend_from_slice(&self.goodness.to_be_bytes());
        out.push(self.directionality);
        out.push(0);
    }

    fn parse(buf: &[u8]) -> io::Result<Self> {
        let mut f = Fields::new(buf, Self::LEN, "entanglement info header")?;
        Ok(Self {
            node_a: f.u32(),
            port_a: f.u16(),
            app_id_a: f.u16(),
            node_b: f.u32(),
            port_b: f.u16(),
            app_id_b: f.u16(),
            entanglement_id: f.u32(),
            timestamp: f.u64(),
            goodness_time: f.u64(),
            goodness: f.u16(),
            directionality: f.u8(),
        })
    }
}
