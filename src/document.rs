/// Document types and the status state machine for invoice-family documents.
///
/// Every [`DocumentType`] has three spellings that round-trip through a single
/// static table: the plural path segment (`invoice_receipts`), the singular
/// container key (`invoice_receipt`) and the display name (`InvoiceReceipt`).
///
/// Status changes go through [`check_transition`], which validates the move
/// against the legal-target table and the type guards, then returns the
/// [`TransitionCode`] the remote service expects.
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::InvoiceXpressError;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentType {
    Invoice,
    SimplifiedInvoice,
    InvoiceReceipt,
    VatMossInvoice,
    CreditNote,
    DebitNote,
    Receipt,
}

/// (type, plural, singular, display)
const SPELLINGS: [(DocumentType, &str, &str, &str); 7] = [
    (DocumentType::Invoice, "invoices", "invoice", "Invoice"),
    (
        DocumentType::SimplifiedInvoice,
        "simplified_invoices",
        "simplified_invoice",
        "SimplifiedInvoice",
    ),
    (
        DocumentType::InvoiceReceipt,
        "invoice_receipts",
        "invoice_receipt",
        "InvoiceReceipt",
    ),
    (
        DocumentType::VatMossInvoice,
        "vat_moss_invoices",
        "vat_moss_invoice",
        "VatMossInvoice",
    ),
    (DocumentType::CreditNote, "credit_notes", "credit_note", "CreditNote"),
    (DocumentType::DebitNote, "debit_notes", "debit_note", "DebitNote"),
    (DocumentType::Receipt, "receipts", "receipt", "Receipt"),
];

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        DocumentType::Invoice,
        DocumentType::SimplifiedInvoice,
        DocumentType::InvoiceReceipt,
        DocumentType::VatMossInvoice,
        DocumentType::CreditNote,
        DocumentType::DebitNote,
        DocumentType::Receipt,
    ];

    fn spellings(self) -> (&'static str, &'static str, &'static str) {
        // SPELLINGS is indexed in declaration order.
        let (_, plural, singular, display) = SPELLINGS[self as usize];
        (plural, singular, display)
    }

    /// Wire path segment, e.g. `invoice_receipts`.
    pub fn plural(self) -> &'static str {
        self.spellings().0
    }

    /// JSON container key, e.g. `invoice_receipt`.
    pub fn singular(self) -> &'static str {
        self.spellings().1
    }

    /// Display name as reported in the `type` field, e.g. `InvoiceReceipt`.
    pub fn display_name(self) -> &'static str {
        self.spellings().2
    }

    pub fn from_plural(s: &str) -> Result<Self, InvoiceXpressError> {
        lookup(s, |entry| entry.1)
    }

    pub fn from_singular(s: &str) -> Result<Self, InvoiceXpressError> {
        lookup(s, |entry| entry.2)
    }

    pub fn from_display(s: &str) -> Result<Self, InvoiceXpressError> {
        lookup(s, |entry| entry.3)
    }

    /// Whether a receipt can be issued against a document of this type.
    pub fn can_create_receipt(self) -> bool {
        matches!(
            self,
            DocumentType::Invoice | DocumentType::SimplifiedInvoice | DocumentType::VatMossInvoice
        )
    }

    /// Fails with `InvalidDocumentType` unless a receipt can be issued.
    pub fn ensure_can_create_receipt(self) -> Result<(), InvoiceXpressError> {
        if self.can_create_receipt() {
            Ok(())
        } else {
            Err(InvoiceXpressError::InvalidDocumentType {
                allowed: vec![
                    DocumentType::Invoice,
                    DocumentType::SimplifiedInvoice,
                    DocumentType::VatMossInvoice,
                ],
            })
        }
    }
}

fn lookup(
    s: &str,
    field: impl Fn(&(DocumentType, &'static str, &'static str, &'static str)) -> &'static str,
) -> Result<DocumentType, InvoiceXpressError> {
    SPELLINGS
        .iter()
        .find(|entry| field(*entry) == s)
        .map(|entry| entry.0)
        .ok_or_else(|| InvoiceXpressError::UnknownDocumentType(s.to_string()))
}

/// `invoice_receipts` -> `invoice_receipt`
pub fn plural_to_singular(plural: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_plural(plural).map(DocumentType::singular)
}

/// `invoice_receipt` -> `invoice_receipts`
pub fn singular_to_plural(singular: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_singular(singular).map(DocumentType::plural)
}

/// `invoice_receipt` -> `InvoiceReceipt`
pub fn singular_to_display(singular: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_singular(singular).map(DocumentType::display_name)
}

/// `InvoiceReceipt` -> `invoice_receipt`
pub fn display_to_singular(display: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_display(display).map(DocumentType::singular)
}

/// `InvoiceReceipt` -> `invoice_receipts`
pub fn display_to_plural(display: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_display(display).map(DocumentType::plural)
}

/// `invoice_receipts` -> `InvoiceReceipt`
pub fn plural_to_display(plural: &str) -> Result<&'static str, InvoiceXpressError> {
    DocumentType::from_plural(plural).map(DocumentType::display_name)
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Accepts any of the three spellings.
impl FromStr for DocumentType {
    type Err = InvoiceXpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SPELLINGS
            .iter()
            .find(|(_, plural, singular, display)| *plural == s || *singular == s || *display == s)
            .map(|entry| entry.0)
            .ok_or_else(|| InvoiceXpressError::UnknownDocumentType(s.to_string()))
    }
}

impl Serialize for DocumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.plural())
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    Final,
    Settled,
    Canceled,
    SecondCopy,
    Deleted,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Final => "final",
            DocumentStatus::Settled => "settled",
            DocumentStatus::Canceled => "canceled",
            DocumentStatus::SecondCopy => "second_copy",
            DocumentStatus::Deleted => "deleted",
        }
    }

    /// `sent` is the service's other name for `final`.
    pub fn normalized(self) -> Self {
        match self {
            DocumentStatus::Sent => DocumentStatus::Final,
            other => other,
        }
    }

    /// Legal targets from this status, before any type guard.
    pub fn allowed_targets(self) -> &'static [DocumentStatus] {
        match self.normalized() {
            DocumentStatus::Draft => &[
                DocumentStatus::Final,
                DocumentStatus::Settled,
                DocumentStatus::Deleted,
            ],
            DocumentStatus::Final => &[DocumentStatus::Canceled, DocumentStatus::Settled],
            DocumentStatus::Settled => &[DocumentStatus::Canceled, DocumentStatus::Final],
            _ => &[],
        }
    }

    pub fn can_transition_to(self, target: DocumentStatus) -> bool {
        self.allowed_targets().contains(&target.normalized())
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = InvoiceXpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "sent" => Ok(DocumentStatus::Sent),
            "final" => Ok(DocumentStatus::Final),
            "settled" => Ok(DocumentStatus::Settled),
            "canceled" => Ok(DocumentStatus::Canceled),
            "second_copy" => Ok(DocumentStatus::SecondCopy),
            "deleted" => Ok(DocumentStatus::Deleted),
            other => Err(InvoiceXpressError::InvalidStatusUpdate {
                current: other.to_string(),
                allowed: Vec::new(),
            }),
        }
    }
}

/// State value sent to the `change-state` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCode {
    Finalized,
    Deleted,
    Canceled,
    Settled,
    Unsettled,
}

impl TransitionCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionCode::Finalized => "finalized",
            TransitionCode::Deleted => "deleted",
            TransitionCode::Canceled => "canceled",
            TransitionCode::Settled => "settled",
            TransitionCode::Unsettled => "unsettled",
        }
    }
}

impl fmt::Display for TransitionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition guard
// ---------------------------------------------------------------------------

/// Validate `current -> requested` for a document of `doc_type` and return the
/// transition code to send.
pub fn check_transition(
    current: DocumentStatus,
    requested: DocumentStatus,
    doc_type: DocumentType,
) -> Result<TransitionCode, InvoiceXpressError> {
    let from = current.normalized();
    let to = requested.normalized();
    debug!(
        "document.check_transition from={} to={} type={}",
        from, to, doc_type
    );

    if !from.can_transition_to(to) {
        return Err(InvoiceXpressError::InvalidStatusUpdate {
            current: current.as_str().to_string(),
            allowed: from.allowed_targets().to_vec(),
        });
    }

    use DocumentStatus::*;
    let code = match (from, to) {
        (Draft, Settled) => {
            require_type(doc_type, &[DocumentType::InvoiceReceipt])?;
            TransitionCode::Finalized
        }
        (Draft, Final) => TransitionCode::Finalized,
        (Draft, Deleted) => TransitionCode::Deleted,
        (Final, Canceled) => TransitionCode::Canceled,
        (Final, Settled) => TransitionCode::Settled,
        (Settled, Canceled) => {
            require_type(doc_type, &[DocumentType::InvoiceReceipt])?;
            TransitionCode::Canceled
        }
        (Settled, Final) => {
            require_type(doc_type, &[DocumentType::CreditNote, DocumentType::DebitNote])?;
            TransitionCode::Unsettled
        }
        // can_transition_to already rejected every other pair
        _ => {
            return Err(InvoiceXpressError::InvalidStatusUpdate {
                current: current.as_str().to_string(),
                allowed: from.allowed_targets().to_vec(),
            })
        }
    };
    Ok(code)
}

/// String form of [`check_transition`]: statuses by name, type by display name.
pub fn check_transition_str(
    current: &str,
    requested: &str,
    doc_type_display: &str,
) -> Result<TransitionCode, InvoiceXpressError> {
    let current_status: DocumentStatus =
        current
            .parse()
            .map_err(|_| InvoiceXpressError::InvalidStatusUpdate {
                current: current.to_string(),
                allowed: Vec::new(),
            })?;
    let requested_status: DocumentStatus =
        requested
            .parse()
            .map_err(|_| InvoiceXpressError::InvalidStatusUpdate {
                current: current.to_string(),
                allowed: current_status.allowed_targets().to_vec(),
            })?;
    if !current_status.can_transition_to(requested_status) {
        return Err(InvoiceXpressError::InvalidStatusUpdate {
            current: current.to_string(),
            allowed: current_status.allowed_targets().to_vec(),
        });
    }
    let doc_type = DocumentType::from_display(doc_type_display)?;
    check_transition(current_status, requested_status, doc_type)
}

/// Display-name form of [`DocumentType::can_create_receipt`]. Unknown names are false.
pub fn can_create_receipt(doc_type_display: &str) -> bool {
    DocumentType::from_display(doc_type_display)
        .map(DocumentType::can_create_receipt)
        .unwrap_or(false)
}

fn require_type(
    doc_type: DocumentType,
    allowed: &[DocumentType],
) -> Result<(), InvoiceXpressError> {
    if allowed.contains(&doc_type) {
        Ok(())
    } else {
        Err(InvoiceXpressError::InvalidDocumentType {
            allowed: allowed.to_vec(),
        })
    }
}
