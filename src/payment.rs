//! QR bank-transfer payment confirmation flow.
//!
//! Drives a payment session from "QR payload generated" to a terminal
//! success/failure outcome: a fixed 10-second grace countdown, then a status
//! probe immediately and every 5 seconds until the backend confirms payment
//! or the probe fails. Confirmation is detected by polling only; there is no
//! push channel.
//!
//! The session is a single authoritative state enum guarded by one lock.
//! Every transition is a single assignment point, checked both before a
//! probe is issued and again after it returns, because a scheduled tick and
//! a just-resolved probe can each reach a decision point while the other is
//! still settling.

use crate::error::{Error, Result};
use crate::gateway::{FollowUpAction, QrEncoder, StatusProbe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Grace period between showing the QR code and the first status probe.
pub const COUNTDOWN_SECS: u32 = 10;

/// Interval between status probes. Polling continues until a terminal
/// outcome; there is no wall-clock limit.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Session state. One field, one lock, single-assignment transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentState {
    /// No active session (initial, and after `close`).
    Waiting,
    /// QR shown, grace countdown running.
    Counting { remaining_secs: u32 },
    /// Polling phase; `probe_in_flight` is true while a check is awaited.
    Checking { probe_in_flight: bool },
    /// Payment confirmed; follow-up action running.
    Succeeding,
    /// Terminal: payment confirmed and follow-up settled.
    Succeeded,
    /// Terminal: QR generation or a status probe failed.
    Failed,
}

impl PaymentState {
    /// Terminal states accept no further transitions until `close`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Succeeded | PaymentState::Failed)
    }
}

/// Inputs identifying one payment session.
#[derive(Clone, Debug)]
pub struct PaymentRequest {
    /// Raw QR payload handed to the encoder.
    pub qr_payload: String,
    /// Invoice being paid.
    pub invoice_id: String,
    /// Order code correlating this session to the backend payment.
    pub order_code: String,
}

/// What happened to the dependent action after payment success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FollowUpOutcome {
    /// The action ran (or was a disguised success); `reference` carries the
    /// created record id when one could be determined.
    Completed { reference: Option<String> },
    /// No follow-up action was configured.
    Skipped,
    /// Payment went through but the dependent step failed and needs manual
    /// attention.
    Failed { message: String },
}

/// Delivered to the success callback exactly once per confirmed payment.
#[derive(Clone, Debug)]
pub struct PaymentReceipt {
    pub order_code: String,
    pub invoice_id: String,
    pub follow_up: FollowUpOutcome,
}

/// Success callback: fires exactly once, after the follow-up settles.
pub type SuccessCallback = Box<dyn Fn(PaymentReceipt) + Send + Sync>;

/// Error callback: fires exactly once, on QR failure or probe failure.
pub type ErrorCallback = Box<dyn Fn(Error) + Send + Sync>;

/// Builder for [`PaymentFlow`].
pub struct PaymentFlowBuilder {
    probe: Arc<dyn StatusProbe>,
    encoder: Arc<dyn QrEncoder>,
    follow_up: Option<Arc<dyn FollowUpAction>>,
    on_success: SuccessCallback,
    on_error: ErrorCallback,
}

impl PaymentFlowBuilder {
    /// Configure the dependent action to run once after payment success.
    pub fn with_follow_up(mut self, follow_up: Arc<dyn FollowUpAction>) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    /// Set the success callback.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(PaymentReceipt) + Send + Sync + 'static,
    {
        self.on_success = Box::new(callback);
        self
    }

    /// Set the error callback.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.on_error = Box::new(callback);
        self
    }

    pub fn build(self) -> PaymentFlow {
        PaymentFlow {
            inner: Arc::new(FlowInner {
                probe: self.probe,
                encoder: self.encoder,
                follow_up: self.follow_up,
                on_success: self.on_success,
                on_error: self.on_error,
                state: Mutex::new(PaymentState::Waiting),
                message: Mutex::new(String::new()),
                qr_image: Mutex::new(None),
                session: Mutex::new(None),
                driver: Mutex::new(None),
            }),
        }
    }
}

struct FlowInner {
    probe: Arc<dyn StatusProbe>,
    encoder: Arc<dyn QrEncoder>,
    follow_up: Option<Arc<dyn FollowUpAction>>,
    on_success: SuccessCallback,
    on_error: ErrorCallback,
    state: Mutex<PaymentState>,
    message: Mutex<String>,
    qr_image: Mutex<Option<String>>,
    session: Mutex<Option<PaymentRequest>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl FlowInner {
    fn set_message(&self, message: &str) {
        *self.message.lock().unwrap() = message.to_string();
    }

    /// Countdown updates only apply while the session is still counting;
    /// a close that raced the driver must not be overwritten.
    fn set_counting(&self, remaining_secs: u32) {
        let mut state = self.state.lock().unwrap();
        if matches!(&*state, PaymentState::Counting { .. }) {
            *state = PaymentState::Counting { remaining_secs };
        }
    }
}

/// The payment confirmation state machine. Clone-able; all clones drive the
/// same session.
///
/// # Example
///
/// ```ignore
/// use frontdesk_kit::payment::{PaymentFlow, PaymentRequest};
///
/// let flow = PaymentFlow::builder(api.clone(), qr.clone())
///     .with_follow_up(record_creator)
///     .on_success(|receipt| ui.show_paid(receipt))
///     .on_error(|err| ui.show_error(err))
///     .build();
///
/// let image = flow.open(PaymentRequest {
///     qr_payload,
///     invoice_id,
///     order_code,
/// }).await?;
/// // render `image`; callbacks fire when polling settles
/// ```
#[derive(Clone)]
pub struct PaymentFlow {
    inner: Arc<FlowInner>,
}

impl PaymentFlow {
    pub fn builder(probe: Arc<dyn StatusProbe>, encoder: Arc<dyn QrEncoder>) -> PaymentFlowBuilder {
        PaymentFlowBuilder {
            probe,
            encoder,
            follow_up: None,
            on_success: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        }
    }

    /// Open a session: encode the QR payload, start the countdown, and spawn
    /// the polling driver. Returns the renderable QR image.
    ///
    /// Any previous session is reset first, so a reopened flow always starts
    /// from a clean countdown.
    ///
    /// # Errors
    ///
    /// Returns `Error::QrError` if the payload cannot be encoded; the error
    /// callback fires and the countdown never starts.
    pub async fn open(&self, request: PaymentRequest) -> Result<String> {
        self.close();

        let image = match self.inner.encoder.encode(&request.qr_payload).await {
            Ok(image) => image,
            Err(e) => {
                let err = match e {
                    Error::QrError(_) => e,
                    other => Error::QrError(other.to_string()),
                };
                *self.inner.state.lock().unwrap() = PaymentState::Failed;
                self.inner.set_message("Could not generate the payment code");
                warn!("QR encode failed for order {}: {}", request.order_code, err);
                (self.inner.on_error)(err.clone());
                return Err(err);
            }
        };

        *self.inner.qr_image.lock().unwrap() = Some(image.clone());
        *self.inner.session.lock().unwrap() = Some(request.clone());
        *self.inner.state.lock().unwrap() = PaymentState::Counting {
            remaining_secs: COUNTDOWN_SECS,
        };
        self.inner.set_message("Scan the code with your banking app");
        info!("Payment session opened for order {}", request.order_code);

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { drive(inner, request).await });
        *self.inner.driver.lock().unwrap() = Some(handle);

        Ok(image)
    }

    /// Manual status check, sharing the exact guards of the timer-driven
    /// probes: a no-op while a probe is in flight or after a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` when no session is open.
    pub async fn check_now(&self) -> Result<PaymentState> {
        let session = self.inner.session.lock().unwrap().clone();
        let Some(request) = session else {
            return Err(Error::ConfigError("no active payment session".to_string()));
        };
        step(&self.inner, &request).await;
        Ok(self.state())
    }

    /// User-initiated close: cancel the driver and reset every piece of
    /// session state so a reopened flow starts clean.
    pub fn close(&self) {
        if let Some(handle) = self.inner.driver.lock().unwrap().take() {
            handle.abort();
        }
        *self.inner.state.lock().unwrap() = PaymentState::Waiting;
        *self.inner.message.lock().unwrap() = String::new();
        *self.inner.qr_image.lock().unwrap() = None;
        *self.inner.session.lock().unwrap() = None;
        debug!("Payment session reset");
    }

    /// Current session state.
    pub fn state(&self) -> PaymentState {
        self.inner.state.lock().unwrap().clone()
    }

    /// Current display message.
    pub fn message(&self) -> String {
        self.inner.message.lock().unwrap().clone()
    }

    /// The rendered QR image, while a session is open.
    pub fn qr_image(&self) -> Option<String> {
        self.inner.qr_image.lock().unwrap().clone()
    }

    /// Seconds remaining before polling begins, while counting down.
    pub fn countdown(&self) -> Option<u32> {
        match *self.inner.state.lock().unwrap() {
            PaymentState::Counting { remaining_secs } => Some(remaining_secs),
            _ => None,
        }
    }
}

async fn drive(inner: Arc<FlowInner>, request: PaymentRequest) {
    for remaining in (1..=COUNTDOWN_SECS).rev() {
        inner.set_counting(remaining);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    {
        let mut state = inner.state.lock().unwrap();
        if !matches!(&*state, PaymentState::Counting { .. }) {
            return;
        }
        *state = PaymentState::Checking {
            probe_in_flight: false,
        };
    }
    inner.set_message("Confirming payment...");
    debug!("Countdown elapsed for order {}, polling begins", request.order_code);

    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // First tick completes immediately: probe at countdown-zero, then
        // every POLL_INTERVAL.
        ticker.tick().await;
        if !step(&inner, &request).await {
            break;
        }
    }
}

enum StepOutcome {
    Confirmed,
    Pending,
    Errored(Error),
}

/// One probe attempt. Returns whether polling should continue.
async fn step(inner: &Arc<FlowInner>, request: &PaymentRequest) -> bool {
    // Entry guard: never start a probe while one is in flight or once the
    // session left the polling phase.
    {
        let mut state = inner.state.lock().unwrap();
        match &*state {
            PaymentState::Checking {
                probe_in_flight: false,
            } => {
                *state = PaymentState::Checking {
                    probe_in_flight: true,
                };
            }
            PaymentState::Checking {
                probe_in_flight: true,
            } => return true,
            _ => return false,
        }
    }

    let result = inner.probe.check(&request.order_code).await;

    // Re-entry guard: a terminal state may have been reached by another path
    // while this probe was in flight.
    let outcome = {
        let mut state = inner.state.lock().unwrap();
        if !matches!(&*state, PaymentState::Checking { .. }) {
            return false;
        }
        match result {
            Ok(true) => {
                // Assigned before any follow-up work so a concurrent tick
                // observes the transition and no-ops.
                *state = PaymentState::Succeeding;
                StepOutcome::Confirmed
            }
            Ok(false) => {
                *state = PaymentState::Checking {
                    probe_in_flight: false,
                };
                StepOutcome::Pending
            }
            Err(e) => {
                *state = PaymentState::Failed;
                StepOutcome::Errored(e)
            }
        }
    };

    match outcome {
        StepOutcome::Confirmed => {
            info!("Payment confirmed for order {}", request.order_code);
            finish_success(inner, request).await;
            false
        }
        StepOutcome::Pending => {
            debug!("Order {} not confirmed yet", request.order_code);
            inner.set_message("Awaiting bank confirmation...");
            true
        }
        StepOutcome::Errored(e) => {
            let err = match e {
                Error::GatewayError(_) => e,
                other => Error::GatewayError(other.to_string()),
            };
            warn!(
                "Status check failed for order {}: {}",
                request.order_code, err
            );
            inner.set_message("Payment confirmation failed");
            (inner.on_error)(err);
            false
        }
    }
}

/// Runs at most once per session: only one probe can take the
/// `Checking -> Succeeding` transition.
async fn finish_success(inner: &Arc<FlowInner>, request: &PaymentRequest) {
    inner.set_message("Payment received, finalizing...");

    let follow_up = match &inner.follow_up {
        Some(action) => match action.run().await {
            Ok(receipt) => FollowUpOutcome::Completed {
                reference: receipt.reference,
            },
            Err(e) => {
                let text = e.to_string();
                if is_disguised_success(&text) {
                    // Backend quirk: some error responses embed a success
                    // message in the payload.
                    info!("Follow-up reported success inside an error payload");
                    FollowUpOutcome::Completed {
                        reference: extract_reference(&text),
                    }
                } else {
                    warn!("Follow-up failed after confirmed payment: {}", text);
                    FollowUpOutcome::Failed { message: text }
                }
            }
        },
        None => FollowUpOutcome::Skipped,
    };

    *inner.state.lock().unwrap() = PaymentState::Succeeded;
    inner.set_message("Payment confirmed");

    (inner.on_success)(PaymentReceipt {
        order_code: request.order_code.clone(),
        invoice_id: request.invoice_id.clone(),
        follow_up,
    });
}

fn is_disguised_success(message: &str) -> bool {
    message.to_lowercase().contains("success")
}

/// Pull the first run of digits out of a message like
/// "Create success, record 4182 created".
fn extract_reference(message: &str) -> Option<String> {
    let digits: String = message
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}
