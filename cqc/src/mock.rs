//! In-memory backends for unit tests.
//!
//! [`MockBackend::scripted`] replays fixed reply bytes. [`MockBackend::new`]
//! decodes every message written to it and answers like a single-node
//! backend whose qubits are modelled as independent Bloch vectors.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::{FRAC_PI_4, TAU};
use std::io::{self, Read, Write};
use std::net::Ipv4Addr;

use cqc_proto::{
    CommandHeader, CommunicationHeader, DEFAULT_PORT, EntanglementInfoHeader, ErrorCode,
    FactoryHeader, Header, Instruction, MeasurementOutcomeHeader, MessageType, Options,
    ProtocolHeader, QubitRefHeader, RotationHeader, TimeInfoHeader,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::Transport;

/// Single-qubit state as a Bloch vector.
#[derive(Debug, Clone, Copy)]
struct Bloch {
    /// ⟨X⟩
    x: f64,
    /// ⟨Y⟩
    y: f64,
    /// ⟨Z⟩
    z: f64,
}

/// Rotates the pair `(a, b)` by `theta`.
fn turn(a: f64, b: f64, theta: f64) -> (f64, f64) {
    let (sin, cos) = theta.sin_cos();
    (a.mul_add(cos, -b * sin), a.mul_add(sin, b * cos))
}

impl Bloch {
    /// |0>
    const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// Maximally mixed; stands in for one half of an EPR pair.
    const MIXED: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Applies a single-qubit gate.
    fn apply(self, instr: Instruction, step: u8) -> Self {
        let Self { x, y, z } = self;
        let theta = f64::from(step) * TAU / 256.0;
        match instr {
            Instruction::X => Self { x, y: -y, z: -z },
            Instruction::Y => Self { x: -x, y, z: -z },
            Instruction::Z => Self { x: -x, y: -y, z },
            Instruction::H => Self { x: z, y: -y, z: x },
            Instruction::K => Self { x: -x, y: z, z: y },
            Instruction::T => {
                let (x, y) = turn(x, y, FRAC_PI_4);
                Self { x, y, z }
            }
            Instruction::RotX => {
                let (y, z) = turn(y, z, theta);
                Self { x, y, z }
            }
            Instruction::RotY => {
                let (z, x) = turn(z, x, theta);
                Self { x, y, z }
            }
            Instruction::RotZ => {
                let (x, y) = turn(x, y, theta);
                Self { x, y, z }
            }
            _ => self,
        }
    }

    /// Returns `true` if the qubit is in |1>.
    fn is_one(self) -> bool {
        self.z <= -1.0 + 1e-9
    }
}

/// A qubit held by the simulated backend.
#[derive(Debug, Clone, Copy)]
struct Qubit {
    /// Current state.
    state: Bloch,
    /// Backend clock at allocation.
    created: u64,
}

/// Backend-side state of the simulator.
#[derive(Debug)]
struct Simulator {
    /// Live qubits by id.
    qubits: BTreeMap<u16, Qubit>,
    /// Next id to hand out.
    next_id: u16,
    /// Logical clock, advanced on every allocation.
    clock: u64,
    /// Maximum number of live qubits.
    capacity: usize,
    /// Next entanglement id.
    next_pair: u32,
    /// Measurement randomness.
    rng: StdRng,
    /// Bytes written but not yet forming a complete message.
    pending: Vec<u8>,
}

/// Outcome of executing one command.
type Step = Result<(), ErrorCode>;

/// Appends one reply message to `out`.
#[allow(clippy::cast_possible_truncation)]
fn reply(out: &mut VecDeque<u8>, tp: MessageType, app_id: u16, body: &[u8]) {
    out.extend(ProtocolHeader::new(tp, app_id, body.len() as u32).to_bytes());
    out.extend(body);
}

/// Splits one command header plus its extension off the front of `buf`.
fn split_command(buf: &[u8]) -> Result<(CommandHeader, &[u8], &[u8]), ErrorCode> {
    let (head, rest) = buf
        .split_at_checked(CommandHeader::LEN)
        .ok_or(ErrorCode::General)?;
    let cmd = CommandHeader::parse(head).map_err(|_| ErrorCode::Unsupported)?;
    let ext_len = cmd.instruction.extension().map_or(0, |k| k.encoded_len());
    let (ext, rest) = rest.split_at_checked(ext_len).ok_or(ErrorCode::General)?;
    Ok((cmd, ext, rest))
}

impl Simulator {
    /// Allocates a qubit in `state`.
    fn allocate(&mut self, state: Bloch) -> Result<u16, ErrorCode> {
        if self.qubits.len() >= self.capacity {
            return Err(ErrorCode::NoQubit);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.clock += 1;
        self.qubits.insert(
            id,
            Qubit {
                state,
                created: self.clock,
            },
        );
        Ok(id)
    }

    /// Looks up a live qubit.
    fn qubit(&mut self, id: u16) -> Result<&mut Qubit, ErrorCode> {
        self.qubits.get_mut(&id).ok_or(ErrorCode::UnknownQubit)
    }

    /// Measures in the Z basis and collapses the state.
    fn measure(&mut self, id: u16) -> Result<u8, ErrorCode> {
        let z = self.qubit(id)?.state.z;
        let p_zero = f64::midpoint(1.0, z).clamp(0.0, 1.0);
        let outcome = u8::from(!self.rng.gen_bool(p_zero));
        let z = if outcome == 0 { 1.0 } else { -1.0 };
        self.qubit(id)?.state = Bloch { x: 0.0, y: 0.0, z };
        Ok(outcome)
    }

    /// Allocates one EPR half and appends the EPR_OK reply.
    fn entangle(
        &mut self,
        app_id: u16,
        remote: CommunicationHeader,
        directionality: u8,
        out: &mut VecDeque<u8>,
    ) -> Step {
        let id = self.allocate(Bloch::MIXED)?;
        self.next_pair += 1;
        let info = EntanglementInfoHeader {
            node_a: u32::from(Ipv4Addr::LOCALHOST),
            port_a: DEFAULT_PORT,
            app_id_a: app_id,
            node_b: remote.remote_node,
            port_b: remote.remote_port,
            app_id_b: remote.remote_app_id,
            entanglement_id: self.next_pair,
            timestamp: self.clock,
            goodness_time: self.clock,
            goodness: 1,
            directionality,
        };
        let mut body = QubitRefHeader { qubit_id: id }.to_bytes();
        info.put(&mut body);
        reply(out, MessageType::EprOk, app_id, &body);
        Ok(())
    }

    /// Executes one command and appends its replies.
    fn run(&mut self, app_id: u16, cmd: CommandHeader, ext: &[u8], out: &mut VecDeque<u8>) -> Step {
        let q = cmd.qubit_id;
        match cmd.instruction {
            Instruction::New => {
                let id = self.allocate(Bloch::ZERO)?;
                reply(out, MessageType::NewOk, app_id, &QubitRefHeader { qubit_id: id }.to_bytes());
            }
            Instruction::Measure | Instruction::MeasureInplace => {
                let outcome = self.measure(q)?;
                if cmd.instruction == Instruction::Measure {
                    self.qubits.remove(&q);
                }
                let body = MeasurementOutcomeHeader { outcome }.to_bytes();
                reply(out, MessageType::MeasOut, app_id, &body);
            }
            Instruction::Reset => self.qubit(q)?.state = Bloch::ZERO,
            Instruction::Send => {
                CommunicationHeader::parse(ext).map_err(|_| ErrorCode::General)?;
                self.qubits.remove(&q).ok_or(ErrorCode::UnknownQubit)?;
            }
            // A peer is always waiting with a fresh qubit.
            Instruction::Recv => {
                let id = self.allocate(Bloch::ZERO)?;
                reply(out, MessageType::Recv, app_id, &QubitRefHeader { qubit_id: id }.to_bytes());
            }
            Instruction::Epr => {
                let remote = CommunicationHeader::parse(ext).map_err(|_| ErrorCode::General)?;
                self.entangle(app_id, remote, 1, out)?;
            }
            Instruction::EprRecv => {
                let peer = CommunicationHeader {
                    remote_app_id: app_id.wrapping_add(1),
                    remote_port: DEFAULT_PORT,
                    remote_node: u32::from(Ipv4Addr::LOCALHOST),
                };
                self.entangle(app_id, peer, 0, out)?;
            }
            Instruction::Cnot | Instruction::Cphase => {
                let target = QubitRefHeader::parse(ext).map_err(|_| ErrorCode::General)?;
                let control = self.qubit(q)?.state;
                let t = self.qubit(target.qubit_id)?;
                if control.is_one() {
                    let gate = if cmd.instruction == Instruction::Cnot {
                        Instruction::X
                    } else {
                        Instruction::Z
                    };
                    t.state = t.state.apply(gate, 0);
                }
            }
            instr => {
                let step = match instr.extension() {
                    Some(_) => RotationHeader::parse(ext).map_err(|_| ErrorCode::General)?.step,
                    None => 0,
                };
                let qubit = self.qubit(q)?;
                qubit.state = qubit.state.apply(instr, step);
            }
        }
        Ok(())
    }

    /// Executes a COMMAND body, following ACTION chains.
    ///
    /// One DONE follows the whole list if any command asked for NOTIFY.
    fn run_list(&mut self, app_id: u16, mut body: &[u8], out: &mut VecDeque<u8>) -> Step {
        let mut notify = false;
        loop {
            let (cmd, ext, rest) = split_command(body)?;
            self.run(app_id, cmd, ext, out)?;
            notify |= cmd.options.contains(Options::NOTIFY);
            if !cmd.options.contains(Options::ACTION) {
                if notify {
                    reply(out, MessageType::Done, app_id, &[]);
                }
                return Ok(());
            }
            let (_, rest) = rest.split_first().ok_or(ErrorCode::General)?;
            body = rest;
        }
    }

    /// Executes a FACTORY body; only the factory's own NOTIFY yields a DONE.
    fn run_factory(&mut self, app_id: u16, body: &[u8], out: &mut VecDeque<u8>) -> Step {
        let (head, body) = body
            .split_at_checked(FactoryHeader::LEN)
            .ok_or(ErrorCode::General)?;
        let fact = FactoryHeader::parse(head).map_err(|_| ErrorCode::General)?;
        let (cmd, ext, _) = split_command(body)?;
        for _ in 0..fact.iterations {
            self.run(app_id, cmd, ext, out)?;
        }
        if fact.options.contains(Options::NOTIFY) {
            reply(out, MessageType::Done, app_id, &[]);
        }
        Ok(())
    }

    /// Executes one complete message.
    fn handle(&mut self, hdr: ProtocolHeader, body: &[u8], out: &mut VecDeque<u8>) {
        let app_id = hdr.app_id;
        let res = match hdr.msg_type {
            MessageType::Hello => {
                reply(out, MessageType::Hello, app_id, &[]);
                Ok(())
            }
            MessageType::Command => self.run_list(app_id, body, out),
            MessageType::Factory => self.run_factory(app_id, body, out),
            MessageType::GetTime => split_command(body).and_then(|(cmd, _, _)| {
                let timestamp = self.qubit(cmd.qubit_id)?.created;
                reply(out, MessageType::InfTime, app_id, &TimeInfoHeader { timestamp }.to_bytes());
                Ok(())
            }),
            _ => Err(ErrorCode::Unsupported),
        };
        if let Err(code) = res {
            reply(out, code.message_type(), app_id, &[]);
        }
    }

    /// Consumes every complete message in `pending`.
    fn drain(&mut self, out: &mut VecDeque<u8>) {
        loop {
            let Some(head) = self.pending.get(..ProtocolHeader::LEN) else {
                return;
            };
            let Ok(hdr) = ProtocolHeader::parse(head) else {
                self.pending.clear();
                reply(out, MessageType::ErrUnsupported, 0, &[]);
                return;
            };
            let end = ProtocolHeader::LEN + hdr.length as usize;
            if self.pending.len() < end {
                return;
            }
            let msg: Vec<u8> = self.pending.drain(..end).collect();
            self.handle(hdr, &msg[ProtocolHeader::LEN..], out);
        }
    }
}

/// A [`Transport`] that never touches the network.
#[derive(Debug)]
pub(crate) struct MockBackend {
    /// Bytes the client wrote.
    written: Vec<u8>,
    /// Bytes the client has yet to read.
    outbox: VecDeque<u8>,
    /// Present when replies are computed rather than scripted.
    sim: Option<Simulator>,
}

impl MockBackend {
    /// A simulated backend with room for 64 qubits.
    pub(crate) fn new() -> Self {
        Self::seeded(7)
    }

    /// A simulated backend whose measurements draw from `seed`.
    pub(crate) fn seeded(seed: u64) -> Self {
        Self {
            written: Vec::new(),
            outbox: VecDeque::new(),
            sim: Some(Simulator {
                qubits: BTreeMap::new(),
                next_id: 1,
                clock: 0,
                capacity: 64,
                next_pair: 0,
                rng: StdRng::seed_from_u64(seed),
                pending: Vec::new(),
            }),
        }
    }

    /// A backend that serves `script` verbatim and ignores what is written.
    pub(crate) fn scripted(script: Vec<u8>) -> Self {
        Self {
            written: Vec::new(),
            outbox: script.into(),
            sim: None,
        }
    }

    /// Limits the simulated backend to `capacity` live qubits.
    pub(crate) fn with_capacity(mut self, capacity: usize) -> Self {
        if let Some(sim) = &mut self.sim {
            sim.capacity = capacity;
        }
        self
    }

    /// Everything the client has written so far.
    pub(crate) fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of reply bytes not yet read.
    pub(crate) fn unread(&self) -> usize {
        self.outbox.len()
    }
}

impl Read for MockBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.outbox.read(buf)
    }
}

impl Write for MockBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        if let Some(sim) = &mut self.sim {
            sim.pending.extend_from_slice(buf);
            sim.drain(&mut self.outbox);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockBackend {
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}
