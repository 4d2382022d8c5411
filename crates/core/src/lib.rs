//! Core of the manuscript editor.
//!
//! - [`patch`] applies positional suggestions to a document, rebasing the
//!   ones still pending after every edit.
//! - [`ledger`] keeps the append-only version history of a document.
//! - [`article`] wraps a versioned document with publication metadata.
//! - [`store`] persists articles, in memory or in PostgreSQL.
//! - [`services`] talks to the external analysis and recommendation services.
//! - [`session`] ties the above into the editing loop.

pub mod article;
pub mod events;
pub mod ledger;
pub mod patch;
pub mod services;
pub mod session;
pub mod store;
