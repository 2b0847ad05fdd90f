//! # frontdesk-kit
//!
//! Client-side data plumbing for front-desk dashboard applications: a keyed
//! resource cache and a QR bank-transfer payment confirmation flow.
//!
//! ## Features
//!
//! - **Keyed resource cache:** fetch-or-serve semantics per resource+params
//!   key, with freshness/staleness windows, cancellation of superseded
//!   fetches, optimistic mutation, and explicit invalidation
//! - **Shared coherence:** one process-wide store; a mutation through one
//!   handle is visible to every handle reading the same key
//! - **Debounced params:** keystroke-driven fetches collapse into one once
//!   input settles
//! - **Payment confirmation:** countdown-then-poll state machine with
//!   at-most-once side effects, tolerant of disguised-success backend
//!   responses
//!
//! ## Quick Start
//!
//! ### Resource cache
//!
//! ```ignore
//! use frontdesk_kit::{ResourceClient, store::InMemoryStore};
//!
//! let client = ResourceClient::new(InMemoryStore::new());
//!
//! let appointments = client.handle("appointments", &params, move || {
//!     let api = api.clone();
//!     async move { api.list_appointments().await }
//! })?;
//!
//! // Serves the cache inside the freshness window, fetches otherwise.
//! let page = appointments.get().await?;
//!
//! // Optimistic update after a successful POST; other screens see it too.
//! appointments.mutate(updated_page).await?;
//! ```
//!
//! ### Payment confirmation
//!
//! ```ignore
//! use frontdesk_kit::payment::{PaymentFlow, PaymentRequest};
//!
//! let flow = PaymentFlow::builder(api.clone(), qr_encoder.clone())
//!     .with_follow_up(record_creator)
//!     .on_success(|receipt| ui.show_paid(receipt))
//!     .on_error(|err| ui.show_error(err))
//!     .build();
//!
//! let qr_image = flow.open(PaymentRequest { qr_payload, invoice_id, order_code }).await?;
//! // 10s countdown, then a status probe every 5s until confirmed or failed.
//! ```

#[macro_use]
extern crate log;

pub mod debounce;
pub mod error;
pub mod gateway;
pub mod key;
pub mod observability;
pub mod payment;
pub mod resource;
pub mod serialization;
pub mod store;

// Re-exports for convenience
pub use debounce::DebouncedHandle;
pub use error::{Error, Result};
pub use gateway::{FollowUpAction, FollowUpReceipt, QrEncoder, StatusProbe};
pub use payment::{PaymentFlow, PaymentReceipt, PaymentRequest, PaymentState};
pub use resource::{global, ResourceClient, ResourceHandle, ResourceOptions, ResourceState};
pub use store::CacheStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
