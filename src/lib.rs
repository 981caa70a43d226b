//! Bank Customer Admin Client Library
//!
//! This library provides the client side of the bank customer administration
//! console: signing in against the authentication endpoint, keeping the
//! session credential, and managing the customer collection exposed by the
//! REST backend.
//!
//! # Modules
//!
//! - `backend_client`: HTTP clients for the customer collection and login.
//! - `cli`: The `bank-admin` terminal front end.
//! - `collection`: Customer Collection Manager (cache, editor, writes).
//! - `config`: Configuration management.
//! - `credential_integrity`: Checksummed envelope for the stored credential.
//! - `errors`: Error handling types.
//! - `form`: Customer editor form and its input constraints.
//! - `models`: Customer and authentication data models.
//! - `presentation`: Currency, credit band, eligibility and summary display.
//! - `session`: Session gate and credential storage.

pub mod backend_client;
pub mod cli;
pub mod collection;
pub mod config;
pub mod credential_integrity;
pub mod errors;
pub mod form;
pub mod models;
pub mod presentation;
pub mod session;
