//! Named single-qubit states and `cqc tomography`.

use anyhow::{Context, Result};
use cqc::tomography::{self, Axis, Expectation};
use cqc::{Instruction, QubitId, Session};

use crate::{Connection, OutputFormat};

/// A state that can be prepared from |0> with Clifford gates.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum State {
    /// |0>
    Zero,
    /// |1>
    One,
    /// |+>
    Plus,
    /// |->
    Minus,
    /// |+i>
    PlusI,
    /// |-i>
    MinusI,
}

impl State {
    /// Gates that take |0> to this state.
    const fn gates(self) -> &'static [Instruction] {
        match self {
            Self::Zero => &[],
            Self::One => &[Instruction::X],
            Self::Plus => &[Instruction::H],
            Self::Minus => &[Instruction::X, Instruction::H],
            Self::PlusI => &[Instruction::K],
            Self::MinusI => &[Instruction::X, Instruction::K],
        }
    }

    const fn expectation(self) -> Expectation {
        match self {
            Self::Zero => Expectation::ZERO,
            Self::One => Expectation::ONE,
            Self::Plus => Expectation::PLUS,
            Self::Minus => Expectation::MINUS,
            Self::PlusI => Expectation::PLUS_I,
            Self::MinusI => Expectation::MINUS_I,
        }
    }

    /// Allocates a qubit and prepares this state on it.
    fn prepare(self, session: &mut Session) -> cqc::Result<QubitId> {
        let q = session.new_qubit()?;
        for &gate in self.gates() {
            session.gate(gate, q)?;
        }
        Ok(q)
    }
}

/// Arguments for `cqc tomography`.
#[derive(clap::Args)]
pub struct TomographyArgs {
    /// State to prepare and verify.
    #[arg(long, default_value = "plus")]
    pub state: State,

    /// Measurements per axis.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub iterations: u32,

    /// Largest accepted deviation of each expectation value.
    #[arg(short, long, default_value_t = 0.1)]
    pub tolerance: f64,
}

impl TomographyArgs {
    pub fn run(self, conn: &Connection, format: OutputFormat) -> Result<()> {
        anyhow::ensure!(
            self.tolerance >= 0.0,
            "tolerance must be non-negative, got {}",
            self.tolerance
        );
        let mut session = conn.open()?;
        let state = self.state;
        let report = tomography::verify_qubit_state(
            &mut session,
            |s: &mut Session| state.prepare(s),
            self.iterations,
            self.tolerance,
            state.expectation(),
        )
        .with_context(|| format!("tomography of {state:?} failed"))?;
        session.close()?;

        if matches!(format, OutputFormat::Json) {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        println!("{:<5} {:>10} {:>10} {:>10}", "AXIS", "MEASURED", "EXPECTED", "DEVIATION");
        for axis in Axis::ALL {
            println!(
                "{:<5} {:>10.4} {:>10.4} {:>10.4}",
                axis.to_string(),
                report.measured.get(axis),
                report.expected.get(axis),
                report.deviation(axis)
            );
        }
        println!(
            "{} ({} samples per axis, tolerance {})",
            report.verdict, report.iterations, report.tolerance
        );
        Ok(())
    }
}
