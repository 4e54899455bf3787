//! Qubit operations built from the message builders and reply waits.
//!
//! Operations that return a value block until the backend answers.
//! [`Session::apply_gate`], [`Session::rotate`] and [`Session::two_qubit`]
//! only send; when `notify` is set the caller collects the DONE with
//! [`Session::wait_done`] before issuing anything else.

use cqc_proto::{Instruction, Options};
use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::message;
use crate::qubit::{EprHalf, QubitId, RemoteApp};
use crate::session::{Session, Transport};

/// Options for a command that may request a DONE.
const fn notify_options(notify: bool) -> Options {
    if notify {
        Options::NOTIFY.union(Options::BLOCK)
    } else {
        Options::empty()
    }
}

impl<T: Transport> Session<T> {
    /// Sends a single command.
    pub fn submit(&mut self, cmd: &Command) -> Result<()> {
        let msg = message::command(self.app_id(), cmd)?;
        debug!(
            app_id = self.app_id(),
            instr = %cmd.instruction(),
            qubit = cmd.header().qubit_id,
            options = cmd.header().options.bits(),
            "sending command"
        );
        self.send(&msg)
    }

    /// Sends a chained command list as one message.
    pub fn submit_sequence(&mut self, cmds: &[Command]) -> Result<()> {
        let msg = message::sequence(self.app_id(), cmds)?;
        debug!(app_id = self.app_id(), count = cmds.len(), "sending command sequence");
        self.send(&msg)
    }

    /// Sends a factory message repeating `cmd` `iterations` times.
    pub fn submit_factory(&mut self, iterations: u8, options: Options, cmd: &Command) -> Result<()> {
        let msg = message::factory(self.app_id(), iterations, options, cmd)?;
        debug!(
            app_id = self.app_id(),
            instr = %cmd.instruction(),
            iterations,
            "sending factory"
        );
        self.send(&msg)
    }

    /// Checks that the backend is alive.
    pub fn hello(&mut self) -> Result<()> {
        let msg = message::hello(self.app_id());
        self.send(&msg)?;
        self.wait_hello()
    }

    /// Allocates a new qubit in |0>.
    pub fn new_qubit(&mut self) -> Result<QubitId> {
        self.submit(&Command::new(Instruction::New, QubitId::new(0)))?;
        self.wait_new_qubit()
    }

    /// Allocates `n` qubits with one factory message.
    pub fn new_qubits(&mut self, n: u8) -> Result<Vec<QubitId>> {
        let cmd = Command::new(Instruction::New, QubitId::new(0));
        self.submit_factory(n, Options::NOTIFY, &cmd)?;
        let mut qubits = Vec::with_capacity(usize::from(n));
        for _ in 0..n {
            qubits.push(self.wait_new_qubit()?);
        }
        self.wait_done(1)?;
        Ok(qubits)
    }

    /// Sends a single-qubit gate.
    ///
    /// With `notify`, the backend answers with one DONE once the gate has
    /// been applied.
    pub fn apply_gate(&mut self, instruction: Instruction, qubit: QubitId, notify: bool) -> Result<()> {
        self.submit(&Command::new(instruction, qubit).options(notify_options(notify)))
    }

    /// Applies a single-qubit gate and waits for it to complete.
    pub fn gate(&mut self, instruction: Instruction, qubit: QubitId) -> Result<()> {
        self.apply_gate(instruction, qubit, true)?;
        self.wait_done(1)
    }

    /// Sends a rotation by `step` × 2π/256 around the axis of `instruction`.
    pub fn rotate(
        &mut self,
        instruction: Instruction,
        qubit: QubitId,
        step: u8,
        notify: bool,
    ) -> Result<()> {
        self.submit(&Command::rotation(instruction, qubit, step).options(notify_options(notify)))
    }

    /// Sends a CNOT or CPHASE gate between `control` and `target`.
    pub fn two_qubit(
        &mut self,
        instruction: Instruction,
        control: QubitId,
        target: QubitId,
        notify: bool,
    ) -> Result<()> {
        if !instruction.is_two_qubit() {
            return Err(Error::InvalidCommand(format!(
                "{instruction} is not a two-qubit gate"
            )));
        }
        let cmd = Command::two_qubit(instruction, control, target);
        let options = cmd.header().options | notify_options(notify);
        self.submit(&cmd.options(options))
    }

    /// Measures `qubit` and releases it.
    pub fn measure(&mut self, qubit: QubitId) -> Result<u8> {
        self.submit(&Command::new(Instruction::Measure, qubit))?;
        self.wait_measurement()
    }

    /// Measures `qubit`, keeping it allocated.
    pub fn measure_inplace(&mut self, qubit: QubitId) -> Result<u8> {
        self.submit(&Command::new(Instruction::MeasureInplace, qubit))?;
        self.wait_measurement()
    }

    /// Resets `qubit` to |0> and waits for completion.
    pub fn reset(&mut self, qubit: QubitId) -> Result<()> {
        self.gate(Instruction::Reset, qubit)
    }

    /// Sends `qubit` to `remote` and waits for completion.
    ///
    /// The local handle is invalid afterwards.
    pub fn send_qubit(&mut self, qubit: QubitId, remote: RemoteApp) -> Result<()> {
        let cmd = Command::remote(Instruction::Send, qubit, remote).options(Options::NOTIFY);
        self.submit(&cmd)?;
        self.wait_done(1)
    }

    /// Waits for a qubit sent to this application.
    pub fn recv_qubit(&mut self) -> Result<QubitId> {
        self.submit(&Command::new(Instruction::Recv, QubitId::new(0)))?;
        self.wait_received_qubit()
    }

    /// Creates an EPR pair with `remote` and returns the local half.
    pub fn create_epr(&mut self, remote: RemoteApp) -> Result<EprHalf> {
        let cmd = Command::remote(Instruction::Epr, QubitId::new(0), remote).options(Options::BLOCK);
        self.submit(&cmd)?;
        self.wait_entanglement()
    }

    /// Waits for the half of an EPR pair created by a remote application.
    pub fn recv_epr(&mut self) -> Result<EprHalf> {
        let cmd = Command::new(Instruction::EprRecv, QubitId::new(0)).options(Options::BLOCK);
        self.submit(&cmd)?;
        self.wait_entanglement()
    }

    /// Returns the creation time of `qubit` as reported by the backend.
    pub fn get_time(&mut self, qubit: QubitId) -> Result<u64> {
        let msg = message::get_time(self.app_id(), qubit);
        self.send(&msg)?;
        self.wait_time()
    }
}
