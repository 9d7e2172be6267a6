//! Curtain Fall Core Library
//!
//! This crate provides the rule model and the DOM side of the Curtain Fall
//! content cleaner: it decides which rules are active on a page and applies
//! them, idempotently, to a document that keeps changing underneath it.
//!
//! # Architecture
//!
//! The engine does no I/O and no selector matching of its own. Documents are
//! reached through the [`dom::Dom`] trait, implemented by the host (the
//! `cf-wasm` crate wraps the browser DOM). Rule snapshots are pushed in by the
//! host whenever storage changes.
//!
//! # Modules
//!
//! - `types`: Filter rules, exception rules and blocking lists
//! - `removal`: Removal specs and the built-in catalog
//! - `domain`: Domain scope matching
//! - `dom`: Host document abstraction
//! - `reconcile`: The reconciliation pass
//! - `selector`: CSS path synthesis for picked elements
//! - `store`: Removal spec storage contract

pub mod dom;
pub mod domain;
pub mod reconcile;
pub mod removal;
pub mod selector;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use dom::{Dom, SelectorError};
pub use domain::applies;
pub use reconcile::{PassOutcome, PassReport, Reconciler, ReconcilerConfig};
pub use removal::{ClassRemoval, RemovalItem, RemovalSpec, StyleReset};
pub use selector::synthesize;
pub use store::{MemoryRemovalStore, RemovalStore, StoreKey};
pub use types::{BlockingList, DomainScoped, ExceptionRule, FilterRule, RuleKind};
