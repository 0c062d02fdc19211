//! InvoiceXpress SDK for Rust.
//!
//! A client for the InvoiceXpress invoicing API: accounts, clients, taxes,
//! items, invoices, receipts and email delivery.
//!
//! # What This SDK Provides
//!
//! - High-level workflow client: [`InvoiceXpressClient`]
//! - Typed REST API access: [`api::InvoiceXpressApi`]
//! - Schema-driven entity mapping between models and wire JSON: [`mapper::Mapper`]
//! - The document type and status state machine: [`document`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use invoicexpress_sdk::{Auth, Client, DocumentType, Invoice, InvoiceXpressClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), invoicexpress_sdk::InvoiceXpressError> {
//!     let client = InvoiceXpressClient::new(Auth::new("my-account", "api-key")?)?;
//!
//!     let mut customer = Client::new();
//!     customer.set_name("ACME, Lda").set_email("billing@acme.pt");
//!
//!     let mut invoice = Invoice::of_type(DocumentType::Invoice);
//!     invoice.set_client(&customer);
//!     client.save_invoice(&mut invoice).await?;
//!     client.finalize_invoice(&mut invoice).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Recommended Workflow
//!
//! 1. Create [`Auth`] credentials and an [`InvoiceXpressClient`].
//! 2. Build entities with the typed setters on the models.
//! 3. Persist them with the `save_*` methods; the entity absorbs the server state.
//! 4. Move documents through their lifecycle with [`InvoiceXpressClient::finalize_invoice`],
//!    [`InvoiceXpressClient::settle_invoice`] and friends. Illegal moves fail before any
//!    request is sent.
//!
//! # Logging
//!
//! This crate emits debug-level logs through the [`log`](https://docs.rs/log/) facade
//! for API, mapper and client calls. Configure any compatible logger in your binary,
//! then set `RUST_LOG=debug` to inspect request flow.
//!
//! # Errors
//!
//! All fallible operations return [`InvoiceXpressError`]. See
//! [`guides::error_handling`] for the variant reference.
//!
//! # Guides
//!
//! - [`guides::entities`]: building entities and outbound payloads
//! - [`guides::documents`]: document types, transitions and receipts
//! - [`guides::error_handling`]: error variants and recovery patterns
pub mod api;
pub mod cast;
pub mod client;
pub mod config;
pub mod decimal;
pub mod document;
pub mod entity;
pub mod errors;
pub mod guides;
pub mod mapper;
pub mod models;
pub mod schema;
pub mod transport;
pub mod value;

// Re-export primary types for convenience.
pub use api::InvoiceXpressApi;
pub use cast::{CastError, CastKind};
pub use client::InvoiceXpressClient;
pub use config::{Auth, ClientConfig};
pub use decimal::FixedDecimal;
pub use document::{check_transition, DocumentStatus, DocumentType, TransitionCode};
pub use entity::{Entity, Record};
pub use errors::InvoiceXpressError;
pub use mapper::Mapper;
pub use models::*;
pub use schema::{EntityKind, SchemaRegistry};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use value::FieldValue;
