//! Backend gateway contracts consumed by the payment flow.
//!
//! These traits decouple the payment state machine from the HTTP client that
//! actually talks to the backend. Implement them with your API client, or use
//! the scripted fakes in this module for unit testing.
//!
//! All three are object-safe async traits: the flow holds them as
//! `Arc<dyn ...>` and drives them from a spawned task.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Payment status check against the backend.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Returns `Ok(true)` once the order has been paid, `Ok(false)` while
    /// confirmation is still pending.
    ///
    /// # Errors
    /// Returns `Err` if the backend call fails. An error is terminal for the
    /// flow; there is no retry-after-error policy.
    async fn check(&self, order_code: &str) -> Result<bool>;
}

/// Turns a QR payload string into a renderable image.
#[async_trait]
pub trait QrEncoder: Send + Sync {
    /// Produce an image data URL for the payload.
    ///
    /// # Errors
    /// Returns `Err` if encoding fails; the flow reports this immediately
    /// without starting its countdown.
    async fn encode(&self, payload: &str) -> Result<String>;
}

/// Result of a follow-up action (e.g. creating the medical record an
/// invoice pays for).
#[derive(Clone, Debug, Default)]
pub struct FollowUpReceipt {
    /// Identifier of the created record, when the backend returns one.
    pub reference: Option<String>,
    /// Free-form backend message.
    pub message: Option<String>,
}

/// Dependent action executed exactly once after payment success.
///
/// Implementations call the backend; the flow itself tolerates backend
/// responses that signal success through a message string under an error
/// status (a documented backend quirk), so implementations may surface such
/// responses as plain errors.
#[async_trait]
pub trait FollowUpAction: Send + Sync {
    /// Run the dependent action.
    ///
    /// # Errors
    /// Returns `Err` on failure. The flow reclassifies errors whose message
    /// indicates success; genuine failures are reported in the receipt
    /// without failing the payment itself.
    async fn run(&self) -> Result<FollowUpReceipt>;
}

// ============================================================================
// Scripted fakes for testing
// ============================================================================

/// Status probe fake that replays a scripted sequence of responses.
///
/// Pops one scripted result per call; once the script is exhausted it keeps
/// answering `Ok(false)`. Tracks how many times it was called.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Result<bool>>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(script: Vec<Result<bool>>) -> Self {
        ScriptedProbe {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `check` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    async fn check(&self, _order_code: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(false))
    }
}

/// QR encoder fake that wraps the payload in a plain-text data URL.
pub struct PassthroughQrEncoder;

#[async_trait]
impl QrEncoder for PassthroughQrEncoder {
    async fn encode(&self, payload: &str) -> Result<String> {
        Ok(format!("data:text/plain,{}", payload))
    }
}

/// Follow-up fake that returns a pre-seeded result and counts runs.
pub struct ScriptedFollowUp {
    result: Mutex<Option<Result<FollowUpReceipt>>>,
    runs: AtomicUsize,
}

impl ScriptedFollowUp {
    pub fn new(result: Result<FollowUpReceipt>) -> Self {
        ScriptedFollowUp {
            result: Mutex::new(Some(result)),
            runs: AtomicUsize::new(0),
        }
    }

    /// How many times `run` has been called.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FollowUpAction for ScriptedFollowUp {
    async fn run(&self) -> Result<FollowUpReceipt> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(FollowUpReceipt::default()))
    }
}
