//! Assembly of complete outgoing messages.
//!
//! Every builder computes `ProtocolHeader.length` from the bytes it actually
//! appended, so the length always matches the body.

use cqc_proto::{
    CommandHeader, FactoryHeader, Header, MessageType, Options, ProtocolHeader, SequenceHeader,
};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::qubit::QubitId;

/// Prefixes `body` with a protocol header of type `msg_type`.
#[allow(clippy::cast_possible_truncation)]
fn frame(msg_type: MessageType, app_id: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ProtocolHeader::LEN + body.len());
    // Bodies are bounded by the header sizes and the u8 sequence length.
    ProtocolHeader::new(msg_type, app_id, body.len() as u32).put(&mut out);
    out.extend_from_slice(body);
    out
}

/// Validates a command that is not followed by chained commands.
fn check_standalone(cmd: &Command) -> Result<()> {
    cmd.validate()?;
    if cmd.header().options.contains(Options::ACTION) {
        return Err(Error::InvalidCommand(format!(
            "{} has ACTION set but no chained commands follow",
            cmd.instruction()
        )));
    }
    Ok(())
}

/// A HELLO message; the backend echoes it.
pub fn hello(app_id: u16) -> Vec<u8> {
    frame(MessageType::Hello, app_id, &[])
}

/// A COMMAND message carrying one command and its extension, if any.
pub fn command(app_id: u16, cmd: &Command) -> Result<Vec<u8>> {
    check_standalone(cmd)?;
    let mut body = Vec::with_capacity(cmd.encoded_len());
    cmd.put(&mut body);
    Ok(frame(MessageType::Command, app_id, &body))
}

/// A COMMAND message that executes `cmds` in order as one chained list.
///
/// ACTION is set on every command but the last, and each is followed by a
/// sequence header giving the byte length of the rest of the list.
pub fn sequence(app_id: u16, cmds: &[Command]) -> Result<Vec<u8>> {
    let Some((last, init)) = cmds.split_last() else {
        return Err(Error::InvalidCommand("empty command sequence".into()));
    };
    let last = last.options(last.header().options - Options::ACTION);
    check_standalone(&last)?;

    let mut tail = Vec::new();
    last.put(&mut tail);
    for cmd in init.iter().rev() {
        cmd.validate()?;
        let cmd_length = u8::try_from(tail.len()).map_err(|_| {
            Error::InvalidCommand(format!(
                "{} bytes chained after {} exceed the sequence limit",
                tail.len(),
                cmd.instruction()
            ))
        })?;
        let chained = cmd.options(cmd.header().options | Options::ACTION);
        let mut part = Vec::with_capacity(chained.encoded_len() + SequenceHeader::LEN + tail.len());
        chained.put(&mut part);
        SequenceHeader { cmd_length }.put(&mut part);
        part.extend_from_slice(&tail);
        tail = part;
    }
    Ok(frame(MessageType::Command, app_id, &tail))
}

/// A FACTORY message executing `cmd` `iterations` times.
pub fn factory(app_id: u16, iterations: u8, options: Options, cmd: &Command) -> Result<Vec<u8>> {
    check_standalone(cmd)?;
    let mut body = Vec::with_capacity(FactoryHeader::LEN + cmd.encoded_len());
    FactoryHeader {
        iterations,
        options,
    }
    .put(&mut body);
    cmd.put(&mut body);
    Ok(frame(MessageType::Factory, app_id, &body))
}

/// A GET_TIME message asking for the creation time of `qubit`.
pub fn get_time(app_id: u16, qubit: QubitId) -> Vec<u8> {
    let header = Command::new(cqc_proto::Instruction::I, qubit).header();
    let mut body = Vec::with_capacity(CommandHeader::LEN);
    header.put(&mut body);
    frame(MessageType::GetTime, app_id, &body)
}
