/// Integration guides for the InvoiceXpress Rust SDK.
///
/// Each sub-module contains a standalone guide rendered from Markdown.
///
/// # Available Guides
///
/// | Guide | Description |
/// |-------|-------------|
/// | [`entities`] | Building entities, payload whitelists and the falsy-drop rule |
/// | [`documents`] | Document types, status transitions and receipts |
/// | [`error_handling`] | Error variants, validation errors and PDF polling |

/// Typed setters, nested entities, inbound unwrapping and outbound payloads.
#[doc = include_str!("../docs/guides/entities.md")]
pub mod entities {}

/// Document type spellings, the transition table and receipt issuing.
#[doc = include_str!("../docs/guides/documents.md")]
pub mod documents {}

/// Error variant reference, 422 validation bodies and waiting for PDFs.
#[doc = include_str!("../docs/guides/error-handling.md")]
pub mod error_handling {}
