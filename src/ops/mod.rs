//! Single-owner operation execution.
//!
//! An [`Operation`] is a unit of work that at most one caller may execute
//! at a time. The gate is an explicit Idle/Running state: an atomic flag
//! observable through [`OpGate::is_running`], a mutex providing the actual
//! exclusion, and a scope guard that returns the gate to Idle even when the
//! body errors or panics.
//!
//! Distinct operations are independent; nothing here serializes access to
//! the registries an operation body touches. Callers that run operations
//! from several threads wrap the core in their own lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use anyhow::Result;
use thiserror::Error;

use crate::core::quay::Quay;

/// Failure to acquire an operation for execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    /// The operation is already being executed and the caller declined to
    /// wait. Programmer misuse, not environmental corruption.
    #[error("operation already has an owner")]
    AlreadyRunning,
}

/// Execution gate guaranteeing at most one concurrent run of an operation.
#[derive(Debug, Default)]
pub struct OpGate {
    running: AtomicBool,
    lock: Mutex<()>,
}

impl OpGate {
    /// A gate in the Idle state.
    pub fn new() -> Self {
        OpGate::default()
    }

    /// Whether some thread currently holds the gate.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Acquire the gate, marking the operation Running.
    ///
    /// With `wait_if_running` the call blocks until the current execution
    /// finishes; without it a held gate fails immediately with
    /// [`OpError::AlreadyRunning`]. The returned guard flips the gate back
    /// to Idle when dropped.
    pub fn acquire(&self, wait_if_running: bool) -> Result<OpGuard<'_>, OpError> {
        let held = if wait_if_running {
            self.lock.lock().unwrap_or_else(PoisonError::into_inner)
        } else {
            match self.lock.try_lock() {
                Ok(held) => held,
                Err(TryLockError::WouldBlock) => return Err(OpError::AlreadyRunning),
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            }
        };

        self.running.store(true, Ordering::Release);
        Ok(OpGuard { gate: self, _held: held })
    }
}

/// Scope guard for a running operation.
///
/// Dropping it returns the gate to Idle and releases the lock.
pub struct OpGuard<'a> {
    gate: &'a OpGate,
    _held: MutexGuard<'a, ()>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.gate.running.store(false, Ordering::Release);
    }
}

/// A unit of work subject to single-owner execution.
///
/// Implementors embed an [`OpGate`] and expose it through
/// [`Operation::gate`]; [`Quay::perform`] handles acquisition and release.
pub trait Operation {
    /// The gate serializing executions of this operation.
    fn gate(&self) -> &OpGate;

    /// The operation body, run with exclusive ownership of the gate.
    fn run(&self, quay: &mut Quay) -> Result<()>;
}
