//! Blocking reply correlation.
//!
//! Each wait reads exactly one protocol header. An error reply is surfaced
//! as [`Error::Backend`] without reading a body; the expected reply type is
//! followed by its fixed-size notification record; anything else means the
//! stream is out of step and poisons the session.

use cqc_proto::{
    EntanglementInfoHeader, MeasurementOutcomeHeader, MessageType, ProtocolHeader,
    QubitRefHeader, TimeInfoHeader,
};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::qubit::{EprHalf, QubitId};
use crate::session::{Session, Transport};

impl<T: Transport> Session<T> {
    /// Reads one protocol header and checks it against `expected`.
    fn expect(&mut self, expected: MessageType) -> Result<ProtocolHeader> {
        let hdr: ProtocolHeader = self.read_header()?;
        debug!(
            app_id = self.app_id(),
            reply = %hdr.msg_type,
            length = hdr.length,
            "received reply"
        );
        if let Some(code) = hdr.msg_type.error_code() {
            warn!(app_id = self.app_id(), %code, "backend returned an error");
            return Err(Error::Backend(code));
        }
        if hdr.msg_type != expected {
            return Err(self.fail(Error::UnexpectedReply {
                expected,
                got: hdr.msg_type,
            }));
        }
        Ok(hdr)
    }

    /// Waits for `n` consecutive DONE replies.
    ///
    /// Stops at the first reply that is not DONE; replies already consumed
    /// stay consumed.
    pub fn wait_done(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.expect(MessageType::Done)?;
        }
        Ok(())
    }

    /// Waits for the HELLO echo.
    pub fn wait_hello(&mut self) -> Result<()> {
        self.expect(MessageType::Hello).map(drop)
    }

    /// Waits for NEW_OK and returns the allocated qubit.
    pub fn wait_new_qubit(&mut self) -> Result<QubitId> {
        self.expect(MessageType::NewOk)?;
        let note: QubitRefHeader = self.read_header()?;
        Ok(QubitId::new(note.qubit_id))
    }

    /// Waits for MEASOUT and returns the measured bit.
    pub fn wait_measurement(&mut self) -> Result<u8> {
        self.expect(MessageType::MeasOut)?;
        let note: MeasurementOutcomeHeader = self.read_header()?;
        if note.outcome > 1 {
            return Err(self.fail(Error::Malformed(format!(
                "measurement outcome {} is not a bit",
                note.outcome
            ))));
        }
        Ok(note.outcome)
    }

    /// Waits for RECV and returns the received qubit.
    pub fn wait_received_qubit(&mut self) -> Result<QubitId> {
        self.expect(MessageType::Recv)?;
        let note: QubitRefHeader = self.read_header()?;
        Ok(QubitId::new(note.qubit_id))
    }

    /// Waits for EPR_OK and returns the local half with its entanglement
    /// information.
    pub fn wait_entanglement(&mut self) -> Result<EprHalf> {
        self.expect(MessageType::EprOk)?;
        let note: QubitRefHeader = self.read_header()?;
        let info: EntanglementInfoHeader = self.read_header()?;
        Ok(EprHalf {
            qubit: QubitId::new(note.qubit_id),
            info,
        })
    }

    /// Waits for INF_TIME and returns the reported timestamp.
    pub fn wait_time(&mut self) -> Result<u64> {
        self.expect(MessageType::InfTime)?;
        let note: TimeInfoHeader = self.read_header()?;
        Ok(note.timestamp)
    }
}
