// Destination-side callbacks for transfers that carry a payload
//
// Settlement finality is independent of callback success: a callback error
// is surfaced to the log and nothing else.

use alloy_primitives::{Address, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A recipient contract's hook, invoked after an executed transfer that
/// carries `ext_data`
pub trait CrossCallee: Send + Sync {
    /// Handle an executed inbound transfer
    ///
    /// `from` is the source-chain sender, `amount` the net amount already
    /// credited, `data` the opaque payload. Returns an error message on
    /// failure; the settlement is final either way.
    fn on_cross_transfer(&self, from: Address, amount: U256, data: &[u8]) -> Result<(), String>;
}

impl<T: CrossCallee + ?Sized> CrossCallee for Arc<T> {
    fn on_cross_transfer(&self, from: Address, amount: U256, data: &[u8]) -> Result<(), String> {
        (**self).on_cross_transfer(from, amount, data)
    }
}

/// One recorded callback invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalleeCall {
    pub from: Address,
    pub amount: U256,
    pub data: Vec<u8>,
}

/// Recording implementation of [`CrossCallee`] for testing
///
/// Register an `Arc<RecordingCallee>` and keep a clone to inspect the
/// recorded invocations afterwards.
pub struct RecordingCallee {
    calls: Mutex<Vec<CalleeCall>>,
    failure_message: Option<String>,
    invocations: AtomicUsize,
}

impl RecordingCallee {
    /// Create a recording callee that accepts every invocation
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure_message: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Configure to fail every invocation with a message
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure_message = Some(message.to_string());
        self
    }

    /// Get the recorded invocations
    pub fn calls(&self) -> Vec<CalleeCall> {
        self.calls.lock().expect("callee lock poisoned").clone()
    }

    /// Get how many times the callee was invoked (including failures)
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Default for RecordingCallee {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossCallee for RecordingCallee {
    fn on_cross_transfer(&self, from: Address, amount: U256, data: &[u8]) -> Result<(), String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure_message {
            return Err(message.clone());
        }
        self.calls
            .lock()
            .expect("callee lock poisoned")
            .push(CalleeCall {
                from,
                amount,
                data: data.to_vec(),
            });
        Ok(())
    }
}
