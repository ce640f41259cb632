//! # routecart-session: Sale Session Orchestration
//!
//! Drives one sale at a time over `routecart-core` and talks to the remote
//! API through a [`Backend`] the host application provides.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   host app ──► SaleSession ──► routecart-core (cart, pricing, payment)  │
//! │       │             │                                                   │
//! │       │             └──────► Backend (load catalog / customer,          │
//! │       │                       submit order / collection)                │
//! │       │                                                                 │
//! │       └──────► collect_payment ──► Backend                              │
//! │                                                                         │
//! │   Errors reach the screen as ApiError { code, message }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - `SaleSession`: cart, payment step, checkout
//! - [`collect`] - Cash collection against a customer balance
//! - [`backend`] - The `Backend` trait and its response types
//! - [`config`] - `SessionConfig` (TOML + `ROUTECART_*` environment)
//! - [`error`] - `SessionError`, `BackendError`, `ApiError`
//! - [`telemetry`] - Tracing subscriber setup

pub mod backend;
pub mod collect;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use backend::{Backend, CollectionConfirmation, OrderConfirmation};
pub use collect::{collect_payment, CollectionReceipt};
pub use config::SessionConfig;
pub use error::{ApiError, BackendError, ErrorCode, SessionError, SessionResult};
pub use session::{CheckoutReceipt, MerchantCheckout, SaleSession};
pub use telemetry::init_tracing;
