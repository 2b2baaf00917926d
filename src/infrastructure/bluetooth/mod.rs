//! Bluetooth Module
//!
//! Decodes notifications from a Medisana BS440 compatible scale and drives
//! its refresh command. The BLE link itself is supplied by the caller
//! through [`service::GattTransport`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     ScaleService                      │
//! │   (session coordinator - public API for the app)     │
//! └──────────────┬───────────────────────────┬───────────┘
//!                │ notifications             │ refresh write
//!                ▼                           ▼
//!        ┌──────────────┐            ┌───────────────┐
//!        │    Router    │            │ GattTransport │
//!        │ - dispatch   │            │ (caller side) │
//!        │ - registry   │            └───────────────┘
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │   Protocol   │
//!        │ - handles    │
//!        │ - decoders   │
//!        │ - refresh    │
//!        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Handles, payload layouts and decoding
//! - [`router`] - Notification dispatch into the person registry
//! - [`service`] - Transport seam and session coordinator

pub mod protocol;
pub mod router;
pub mod service;

// Re-export main service for convenience
pub use service::{GattTransport, ScaleService};
