//! Commands that involve a remote application: send, recv, epr, epr-recv.

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use anyhow::{Context, Result, bail};
use cqc::{EprHalf, Instruction, RemoteApp};

use crate::{Connection, OutputFormat};

/// Remote end of a SEND or EPR.
#[derive(clap::Args)]
pub struct RemoteArgs {
    /// Application id on the remote node.
    #[arg(long)]
    pub remote_app: u16,

    /// Host name or IPv4 address of the remote node.
    #[arg(long)]
    pub remote_host: String,

    /// Classical control port of the remote node.
    #[arg(long, default_value_t = cqc::DEFAULT_PORT)]
    pub remote_port: u16,
}

impl RemoteArgs {
    /// Resolves the remote host to an IPv4 address.
    fn resolve(&self) -> Result<RemoteApp> {
        let addrs = (self.remote_host.as_str(), self.remote_port)
            .to_socket_addrs()
            .with_context(|| format!("cannot resolve {}", self.remote_host))?;
        for addr in addrs {
            if let IpAddr::V4(v4) = addr.ip() {
                return Ok(RemoteApp::new(self.remote_app, v4, self.remote_port));
            }
        }
        bail!("{} has no IPv4 address", self.remote_host)
    }
}

pub fn send(conn: &Connection, format: OutputFormat, args: &RemoteArgs) -> Result<()> {
    let remote = args.resolve()?;
    let mut session = conn.open()?;
    let q = session.new_qubit().context("cannot allocate a qubit")?;
    session.gate(Instruction::H, q)?;
    session
        .send_qubit(q, remote)
        .with_context(|| format!("cannot send {q} to app {}", remote.app_id))?;
    session.close()?;
    let json = serde_json::json!({ "qubit": q, "remote": remote });
    format.emit(
        &json,
        &format!("sent {q} to app {} at {}:{}", remote.app_id, remote.node, remote.port),
    )
}

pub fn recv(conn: &Connection, format: OutputFormat) -> Result<()> {
    let mut session = conn.open()?;
    let q = session.recv_qubit().context("no qubit received")?;
    let outcome = session.measure(q)?;
    session.close()?;
    let json = serde_json::json!({ "qubit": q, "outcome": outcome });
    format.emit(&json, &format!("received {q}, measured {outcome}"))
}

pub fn epr(conn: &Connection, format: OutputFormat, args: &RemoteArgs) -> Result<()> {
    let remote = args.resolve()?;
    let mut session = conn.open()?;
    let half = session
        .create_epr(remote)
        .with_context(|| format!("cannot create an EPR pair with app {}", remote.app_id))?;
    finish_epr(session, format, half)
}

pub fn epr_recv(conn: &Connection, format: OutputFormat) -> Result<()> {
    let mut session = conn.open()?;
    let half = session.recv_epr().context("no EPR half received")?;
    finish_epr(session, format, half)
}

/// Measures the local half and prints it with its entanglement info.
fn finish_epr(mut session: cqc::Session, format: OutputFormat, half: EprHalf) -> Result<()> {
    let outcome = session.measure(half.qubit)?;
    session.close()?;
    let json = serde_json::json!({ "epr": half, "outcome": outcome });
    let info = &half.info;
    let text = format!(
        "{} (pair {}, {}:{} app {} <-> {}:{} app {}), measured {outcome}",
        half.qubit,
        info.entanglement_id,
        Ipv4Addr::from(info.node_a),
        info.port_a,
        info.app_id_a,
        Ipv4Addr::from(info.node_b),
        info.port_b,
        info.app_id_b,
    );
    format.emit(&json, &text)
}
