//! Blocking client for the CQC quantum network protocol.
//!
//! A [`Session`] speaks CQC to one backend over a TCP stream on behalf of a
//! single application id. Every operation sends one message and, where the
//! backend answers, blocks until the reply has been read, so at most one
//! command is ever outstanding.
//!
//! # Quick start
//!
//! ```no_run
//! use cqc::{Instruction, Session};
//!
//! let mut session = Session::connect(10, "localhost", cqc::DEFAULT_PORT)?;
//! session.hello()?;
//!
//! let q = session.new_qubit()?;
//! session.gate(Instruction::H, q)?;
//! let bit = session.measure(q)?;
//! println!("measured {bit}");
//!
//! session.close()?;
//! # Ok::<(), cqc::Error>(())
//! ```
//!
//! Errors fall into three groups. Transport and protocol failures poison the
//! session ([`Error::is_fatal`]); an explicit error reply from the backend
//! surfaces as [`Error::Backend`] and leaves the session usable.

mod command;
mod error;
pub mod message;
#[cfg(test)]
mod mock;
mod ops;
mod qubit;
mod reply;
mod session;
pub mod tomography;

pub use command::{Command, Extension};
pub use cqc_proto::{
    DEFAULT_PORT, EntanglementInfoHeader, ErrorCode, Instruction, MessageType, Options,
};
pub use error::{Error, Result};
pub use qubit::{EprHalf, QubitId, RemoteApp};
pub use session::{Session, Transport};
pub use tomography::{Axis, Expectation, Prepare, Verdict, Verification, verify_qubit_state};
