//! Statistical verification of state preparation.
//!
//! A [`Prepare`] routine is run repeatedly; each fresh qubit is rotated into
//! the measurement basis of one axis and measured. Outcome 0 counts +1 and
//! outcome 1 counts −1, so the mean estimates the expectation value of the
//! Pauli observable along that axis with a standard error of about
//! `1/√iterations`.

use std::fmt;

use cqc_proto::Instruction;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::qubit::QubitId;
use crate::session::{Session, Transport};

/// A routine that leaves a freshly prepared qubit on the backend.
///
/// Implemented for every `FnMut(&mut Session<T>) -> Result<QubitId>`, so a
/// closure is usually enough:
///
/// ```no_run
/// use cqc::{Instruction, Session, tomography::{self, Expectation}};
///
/// let mut session = Session::connect(10, "localhost", cqc::DEFAULT_PORT)?;
/// let plus = |s: &mut Session| -> cqc::Result<_> {
///     let q = s.new_qubit()?;
///     s.gate(Instruction::H, q)?;
///     Ok(q)
/// };
/// let report = tomography::verify_qubit_state(&mut session, plus, 500, 0.1, Expectation::PLUS)?;
/// println!("{}", report.verdict);
/// # Ok::<(), cqc::Error>(())
/// ```
pub trait Prepare<T: Transport> {
    /// Prepares one qubit and returns its handle.
    fn prepare(&mut self, session: &mut Session<T>) -> Result<QubitId>;
}

impl<T, F> Prepare<T> for F
where
    T: Transport,
    F: FnMut(&mut Session<T>) -> Result<QubitId>,
{
    fn prepare(&mut self, session: &mut Session<T>) -> Result<QubitId> {
        self(session)
    }
}

/// Measurement axis of the Bloch sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Computational basis.
    Z,
    /// Hadamard basis.
    X,
    /// Circular basis.
    Y,
}

impl Axis {
    /// All axes in the order [`verify_qubit_state`] visits them.
    pub const ALL: [Self; 3] = [Self::Z, Self::X, Self::Y];

    /// Gate that rotates this axis onto Z, if one is needed.
    pub const fn basis_change(self) -> Option<Instruction> {
        match self {
            Self::Z => None,
            Self::X => Some(Instruction::H),
            Self::Y => Some(Instruction::K),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Z => "Z",
            Self::X => "X",
            Self::Y => "Y",
        })
    }
}

/// Expectation values along the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// ⟨X⟩
    pub x: f64,
    /// ⟨Y⟩
    pub y: f64,
    /// ⟨Z⟩
    pub z: f64,
}

impl Expectation {
    /// |0>
    pub const ZERO: Self = Self::new(0.0, 0.0, 1.0);
    /// |1>
    pub const ONE: Self = Self::new(0.0, 0.0, -1.0);
    /// |+>
    pub const PLUS: Self = Self::new(1.0, 0.0, 0.0);
    /// |->
    pub const MINUS: Self = Self::new(-1.0, 0.0, 0.0);
    /// |+i>
    pub const PLUS_I: Self = Self::new(0.0, 1.0, 0.0);
    /// |-i>
    pub const MINUS_I: Self = Self::new(0.0, -1.0, 0.0);

    /// Creates an expectation triple.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component along `axis`.
    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Sets the component along `axis`.
    const fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

/// Outcome of a completed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Every axis is within tolerance.
    Match,
    /// At least one axis deviates by more than the tolerance.
    Mismatch,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Match => "MATCH",
            Self::Mismatch => "MISMATCH",
        })
    }
}

/// Result of [`verify_qubit_state`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Estimated expectation values.
    pub measured: Expectation,
    /// Expectation values the preparation should produce.
    pub expected: Expectation,
    /// Largest accepted deviation per axis.
    pub tolerance: f64,
    /// Samples taken per axis.
    pub iterations: u32,
    /// Overall outcome.
    pub verdict: Verdict,
}

impl Verification {
    /// Absolute deviation along `axis`.
    pub fn deviation(&self, axis: Axis) -> f64 {
        (self.measured.get(axis) - self.expected.get(axis)).abs()
    }

    /// Returns `true` if every axis is within tolerance.
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

/// Estimates the expectation value along `axis` from `iterations` samples.
///
/// Any error from `prepare`, the basis change or the measurement aborts the
/// run and is returned unchanged.
pub fn tomography_along_axis<T, P>(
    session: &mut Session<T>,
    prepare: &mut P,
    iterations: u32,
    axis: Axis,
) -> Result<f64>
where
    T: Transport,
    P: Prepare<T> + ?Sized,
{
    if iterations == 0 {
        return Err(Error::ZeroIterations);
    }
    let (mut zeros, mut ones) = (0u32, 0u32);
    for i in 0..iterations {
        let qubit = prepare.prepare(session)?;
        if let Some(gate) = axis.basis_change() {
            session.gate(gate, qubit)?;
        }
        let outcome = session.measure(qubit)?;
        trace!(%axis, iteration = i, %qubit, outcome, "tomography sample");
        if outcome == 0 {
            zeros += 1;
        } else {
            ones += 1;
        }
    }
    let mean = (f64::from(zeros) - f64::from(ones)) / f64::from(iterations);
    debug!(%axis, iterations, mean, "tomography axis done");
    Ok(mean)
}

/// Checks that `prepare` produces a state with expectation values
/// `expected`.
///
/// Axes are estimated in the order Z, X, Y. The first failing axis ends the
/// run with its error; otherwise the verdict is [`Verdict::Mismatch`] if any
/// axis deviates by more than `tolerance`. A tolerance that is negative or
/// not finite is rejected before anything is sent.
pub fn verify_qubit_state<T, P>(
    session: &mut Session<T>,
    mut prepare: P,
    iterations: u32,
    tolerance: f64,
    expected: Expectation,
) -> Result<Verification>
where
    T: Transport,
    P: Prepare<T>,
{
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(Error::InvalidTolerance(tolerance));
    }
    let mut measured = Expectation::new(0.0, 0.0, 0.0);
    let mut verdict = Verdict::Match;
    for axis in Axis::ALL {
        let value = tomography_along_axis(session, &mut prepare, iterations, axis)?;
        measured.set(axis, value);
        let want = expected.get(axis);
        if (value - want).abs() > tolerance {
            warn!(%axis, measured = value, expected = want, tolerance, "axis out of tolerance");
            verdict = Verdict::Mismatch;
        }
    }
    Ok(Verification {
        measured,
        expected,
        tolerance,
        iterations,
        verdict,
    })
}
