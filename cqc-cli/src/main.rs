//! Demo CLI for the CQC quantum network client.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod net;
mod state;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cqc::{Instruction, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cqc", version, about = "Talk CQC to a quantum network backend")]
struct Cli {
    #[command(flatten)]
    conn: Connection,

    /// Log protocol traffic (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format.
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

/// Where the backend listens and who we are.
#[derive(clap::Args)]
pub(crate) struct Connection {
    /// Backend host name or address.
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    /// Backend port.
    #[arg(short, long, global = true, default_value_t = cqc::DEFAULT_PORT)]
    port: u16,

    /// Application id stamped on every message.
    #[arg(short, long, global = true, default_value_t = 10)]
    app_id: u16,
}

impl Connection {
    /// Opens a session with the configured backend.
    pub(crate) fn open(&self) -> Result<Session> {
        Session::connect(self.app_id, &self.host, self.port)
            .with_context(|| format!("app {} cannot reach the backend", self.app_id))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend answers.
    Hello,

    /// Create a qubit and measure it.
    Measure {
        /// Apply a Hadamard gate first, giving a fair coin.
        #[arg(long)]
        hadamard: bool,
    },

    /// Verify that a state is prepared correctly by tomography.
    Tomography(state::TomographyArgs),

    /// Prepare |+> and send it to a remote application.
    Send(net::RemoteArgs),

    /// Wait for a qubit from a remote application and measure it.
    Recv,

    /// Create an EPR pair with a remote application.
    Epr(net::RemoteArgs),

    /// Receive the half of an EPR pair created remotely.
    EprRecv,

    /// Show the creation time of a fresh qubit.
    Time,

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

impl OutputFormat {
    /// Prints `json` in JSON mode and `text` otherwise.
    pub(crate) fn emit(self, json: &serde_json::Value, text: &str) -> Result<()> {
        match self {
            Self::Json => println!("{}", serde_json::to_string_pretty(json)?),
            Self::Table => println!("{text}"),
        }
        Ok(())
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = cli.dispatch() {
        eprintln!("cqc: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        let Self {
            conn,
            format,
            command,
            ..
        } = self;
        match command {
            Command::Hello => hello(&conn, format),
            Command::Measure { hadamard } => measure(&conn, format, hadamard),
            Command::Tomography(args) => args.run(&conn, format),
            Command::Send(args) => net::send(&conn, format, &args),
            Command::Recv => net::recv(&conn, format),
            Command::Epr(args) => net::epr(&conn, format, &args),
            Command::EprRecv => net::epr_recv(&conn, format),
            Command::Time => time(&conn, format),
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "cqc", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}

fn hello(conn: &Connection, format: OutputFormat) -> Result<()> {
    let mut session = conn.open()?;
    session.hello().context("HELLO round trip failed")?;
    session.close()?;
    let json = serde_json::json!({ "host": conn.host, "port": conn.port, "alive": true });
    format.emit(&json, &format!("{}:{} is alive", conn.host, conn.port))
}

fn measure(conn: &Connection, format: OutputFormat, hadamard: bool) -> Result<()> {
    let mut session = conn.open()?;
    let q = session.new_qubit().context("cannot allocate a qubit")?;
    if hadamard {
        session.gate(Instruction::H, q)?;
    }
    let outcome = session.measure(q)?;
    session.close()?;
    let json = serde_json::json!({ "qubit": q, "outcome": outcome });
    format.emit(&json, &format!("{q}: {outcome}"))
}

fn time(conn: &Connection, format: OutputFormat) -> Result<()> {
    let mut session = conn.open()?;
    let q = session.new_qubit().context("cannot allocate a qubit")?;
    let timestamp = session.get_time(q)?;
    session.measure(q)?;
    session.close()?;
    let json = serde_json::json!({ "qubit": q, "timestamp": timestamp });
    format.emit(&json, &format!("{q} created at {timestamp}"))
}
