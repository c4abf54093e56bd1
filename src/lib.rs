//! Terravia Commerce Platform
//!
//! Self-hosted travel commerce backend.
//!
//! ## Features
//! - Travel product and package catalog
//! - Per-user carts with atomic add-or-increment lines
//! - Coupons with race-safe usage caps
//! - Transactional checkout with price snapshots
//! - Payments behind a swappable gateway capability
//! - Order lifecycle notifications

pub mod domain;
pub mod error;
pub mod gateway;
pub mod http;
pub mod store;

pub use error::{Error, Result};

use std::sync::Arc;

use crate::gateway::PaymentGateway;
use crate::store::{Notifier, Store};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub notifier: Notifier,
    pub gateway: Arc<dyn PaymentGateway>,
}
