/// Entity schema registry.
///
/// Static, declarative metadata per entity kind: wire container key, id and
/// URL identifier names, write whitelists, URL templates and the per-field
/// descriptor table (cast kind, nested shape, optional custom setter). The
/// mapper and the API layer consume these tables; nothing here has behavior
/// beyond lookup.
use std::fmt;

use serde_json::Value;

use crate::cast::{CastError, CastKind};
use crate::entity::Entity;
use crate::errors::InvoiceXpressError;
use crate::models::apply_mb_reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Account,
    Client,
    PreferredContact,
    Invoice,
    InvoiceItem,
    Tax,
    Receipt,
    Email,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Account => "Account",
            EntityKind::Client => "Client",
            EntityKind::PreferredContact => "PreferredContact",
            EntityKind::Invoice => "Invoice",
            EntityKind::InvoiceItem => "InvoiceItem",
            EntityKind::Tax => "Tax",
            EntityKind::Receipt => "Receipt",
            EntityKind::Email => "Email",
        }
    }

    /// Schema from the standard registry.
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Account => &ACCOUNT,
            EntityKind::Client => &CLIENT,
            EntityKind::PreferredContact => &PREFERRED_CONTACT,
            EntityKind::Invoice => &INVOICE,
            EntityKind::InvoiceItem => &INVOICE_ITEM,
            EntityKind::Tax => &TAX,
            EntityKind::Receipt => &RECEIPT,
            EntityKind::Email => &EMAIL,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------

/// How a field's value is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Scalar,
    Nested(EntityKind),
    List(EntityKind),
}

/// Custom assignment hook for fields whose wire value needs reshaping.
pub type FieldSetter = fn(&mut Entity, &Value) -> Result<(), CastError>;

#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub cast: Option<CastKind>,
    pub shape: FieldShape,
    pub setter: Option<FieldSetter>,
}

impl FieldDescriptor {
    pub const fn cast(name: &'static str, cast: CastKind) -> Self {
        Self {
            name,
            cast: Some(cast),
            shape: FieldShape::Scalar,
            setter: None,
        }
    }

    pub const fn nested(name: &'static str, kind: EntityKind) -> Self {
        Self {
            name,
            cast: None,
            shape: FieldShape::Nested(kind),
            setter: None,
        }
    }

    pub const fn list(name: &'static str, kind: EntityKind) -> Self {
        Self {
            name,
            cast: None,
            shape: FieldShape::List(kind),
            setter: None,
        }
    }

    pub const fn with_setter(mut self, setter: FieldSetter) -> Self {
        self.setter = Some(setter);
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("cast", &self.cast)
            .field("shape", &self.shape)
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Entity schemas
// ---------------------------------------------------------------------------

/// Named URL templates an entity may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Item,
    ItemAction,
    Items,
    Create,
    Pdf,
    PdfDownload,
    Documents,
    ClientInvoices,
    SearchByCode,
    SearchByName,
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Wire wrapper key, e.g. `invoice`.
    pub container: Option<&'static str>,
    /// Wrapper used on create when it differs from `container`.
    pub create_container: Option<&'static str>,
    pub id_field: &'static str,
    /// URL placeholder carrying the id, e.g. `client_id`.
    pub identifier: Option<&'static str>,
    /// URL placeholder carrying the document type.
    pub type_identifier: Option<&'static str>,
    pub create_keys: &'static [&'static str],
    pub update_keys: &'static [&'static str],
    /// Additional projections, e.g. the client keys embedded in an invoice.
    pub key_sets: &'static [(&'static str, &'static [&'static str])],
    pub urls: &'static [(Endpoint, &'static str)],
    pub fields: &'static [FieldDescriptor],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn cast_for(&self, name: &str) -> Option<CastKind> {
        self.field(name).and_then(|f| f.cast)
    }

    pub fn shape_of(&self, name: &str) -> FieldShape {
        self.field(name).map(|f| f.shape).unwrap_or(FieldShape::Scalar)
    }

    pub fn url(&self, endpoint: Endpoint) -> Result<&'static str, InvoiceXpressError> {
        self.urls
            .iter()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, url)| *url)
            .ok_or_else(|| {
                InvoiceXpressError::Other(format!("{} has no {:?} endpoint", self.kind, endpoint))
            })
    }

    pub fn keys(&self, set: &str) -> &'static [&'static str] {
        self.key_sets
            .iter()
            .find(|(name, _)| *name == set)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }

    pub fn create_wrapper(&self) -> Option<&'static str> {
        self.create_container.or(self.container)
    }
}

/// Lookup table from entity kind to schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRegistry {
    schemas: &'static [&'static EntitySchema],
}

static STANDARD: SchemaRegistry = SchemaRegistry {
    schemas: &[
        &ACCOUNT,
        &CLIENT,
        &PREFERRED_CONTACT,
        &INVOICE,
        &INVOICE_ITEM,
        &TAX,
        &RECEIPT,
        &EMAIL,
    ],
};

impl SchemaRegistry {
    pub const fn new(schemas: &'static [&'static EntitySchema]) -> Self {
        Self { schemas }
    }

    /// The registry covering every entity the SDK ships.
    pub fn standard() -> &'static SchemaRegistry {
        &STANDARD
    }

    pub fn get(&self, kind: EntityKind) -> Option<&'static EntitySchema> {
        self.schemas.iter().copied().find(|s| s.kind == kind)
    }

    pub fn require(&self, kind: EntityKind) -> Result<&'static EntitySchema, InvoiceXpressError> {
        self.get(kind)
            .ok_or_else(|| InvoiceXpressError::Other(format!("no schema registered for {kind}")))
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.schemas.iter().map(|s| s.kind)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        STANDARD
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const ACCOUNT_KEYS: &[&str] = &[
    "first_name",
    "last_name",
    "organization_name",
    "phone",
    "email",
    "password",
    "fiscal_id",
    "tax_country",
    "language",
    "terms",
    "marketing",
];

pub static ACCOUNT: EntitySchema = EntitySchema {
    kind: EntityKind::Account,
    container: Some("account"),
    create_container: None,
    id_field: "id",
    identifier: Some("account_id"),
    type_identifier: None,
    create_keys: ACCOUNT_KEYS,
    update_keys: ACCOUNT_KEYS,
    key_sets: &[],
    urls: &[
        (Endpoint::Item, "/api/accounts/{account_id}/{action}.json"),
        (Endpoint::Items, "/api/accounts/{action}.json"),
    ],
    fields: &[
        FieldDescriptor::cast("terms", CastKind::String),
        FieldDescriptor::cast("marketing", CastKind::String),
    ],
};

const CLIENT_CREATE_KEYS: &[&str] = &[
    "name",
    "code",
    "email",
    "language",
    "address",
    "city",
    "postal_code",
    "country",
    "fiscal_id",
    "website",
    "phone",
    "fax",
    "preferred_contact",
    "observations",
    "send_options",
];

const CLIENT_UPDATE_KEYS: &[&str] = &[
    "name",
    "code",
    "email",
    "language",
    "address",
    "city",
    "postal_code",
    "country",
    "fiscal_id",
    "website",
    "phone",
    "fax",
    "preferred_contact",
    "observations",
    "send_options",
    "currency_id",
];

/// Client fields embedded in an invoice.
pub const CLIENT_INVOICE_KEYS: &[&str] = &[
    "name",
    "code",
    "email",
    "address",
    "city",
    "postal_code",
    "country",
    "fiscal_id",
    "website",
    "phone",
    "fax",
    "observations",
];

pub static CLIENT: EntitySchema = EntitySchema {
    kind: EntityKind::Client,
    container: Some("client"),
    create_container: None,
    id_field: "id",
    identifier: Some("client_id"),
    type_identifier: None,
    create_keys: CLIENT_CREATE_KEYS,
    update_keys: CLIENT_UPDATE_KEYS,
    key_sets: &[("invoice", CLIENT_INVOICE_KEYS)],
    urls: &[
        (Endpoint::Item, "/clients/{client_id}.json"),
        (Endpoint::Items, "/clients.json"),
        (Endpoint::Create, "/clients.json"),
        (Endpoint::ClientInvoices, "/clients/{client_id}/invoices.json"),
        (Endpoint::SearchByCode, "/clients/find-by-code.json"),
        (Endpoint::SearchByName, "/clients/find-by-name.json"),
    ],
    fields: &[
        FieldDescriptor::cast("phone", CastKind::String),
        FieldDescriptor::cast("fiscal_id", CastKind::String),
        FieldDescriptor::nested("preferred_contact", EntityKind::PreferredContact),
    ],
};

pub static PREFERRED_CONTACT: EntitySchema = EntitySchema {
    kind: EntityKind::PreferredContact,
    container: Some("preferred_contact"),
    create_container: None,
    id_field: "id",
    identifier: None,
    type_identifier: None,
    create_keys: &["name", "email", "phone"],
    update_keys: &["name", "email", "phone"],
    key_sets: &[],
    urls: &[],
    fields: &[
        FieldDescriptor::cast("name", CastKind::String),
        FieldDescriptor::cast("email", CastKind::String),
        FieldDescriptor::cast("phone", CastKind::String),
    ],
};

const INVOICE_KEYS: &[&str] = &[
    "date",
    "due_date",
    "reference",
    "observations",
    "retention",
    "tax_exemption",
    "sequence_id",
    "manual_sequence_number",
    "client",
    "items",
    "mb_reference",
    "owner_invoice_id",
    "tax_exemption_reason",
    "currency_code",
    "rate",
];

pub static INVOICE: EntitySchema = EntitySchema {
    kind: EntityKind::Invoice,
    container: Some("invoice"),
    create_container: None,
    id_field: "id",
    identifier: Some("document_id"),
    type_identifier: Some("document_type"),
    create_keys: INVOICE_KEYS,
    update_keys: INVOICE_KEYS,
    key_sets: &[("change_state", &["state", "message"])],
    urls: &[
        (Endpoint::Item, "/{document_type}/{document_id}.json"),
        (Endpoint::ItemAction, "/{document_type}/{document_id}/{action}.json"),
        (Endpoint::Create, "/{document_type}.json"),
        (Endpoint::Items, "/invoices.json"),
        (Endpoint::Pdf, "/api/pdf/{document_id}.json"),
        (Endpoint::PdfDownload, "/pdf/start/{document_id}/{second_copy}"),
        (Endpoint::Documents, "/document/{document_id}/{action}.json"),
    ],
    fields: &[
        FieldDescriptor::cast("date", CastKind::ToDate),
        FieldDescriptor::cast("due_date", CastKind::ToDate),
        FieldDescriptor::cast("reference", CastKind::String),
        FieldDescriptor::cast("observations", CastKind::String),
        FieldDescriptor::cast("retention", CastKind::String),
        FieldDescriptor::cast("mb_reference", CastKind::String).with_setter(apply_mb_reference),
        FieldDescriptor::cast("owner_invoice_id", CastKind::String),
        FieldDescriptor::cast("tax_exemption", CastKind::String),
        FieldDescriptor::cast("tax_exemption_reason", CastKind::String),
        FieldDescriptor::cast("rate", CastKind::String),
        FieldDescriptor::nested("client", EntityKind::Client),
        FieldDescriptor::list("items", EntityKind::InvoiceItem),
    ],
};

const ITEM_KEYS: &[&str] = &["name", "description", "unit_price", "unit", "tax"];

pub static INVOICE_ITEM: EntitySchema = EntitySchema {
    kind: EntityKind::InvoiceItem,
    container: Some("item"),
    create_container: None,
    id_field: "id",
    identifier: Some("item_id"),
    type_identifier: None,
    create_keys: ITEM_KEYS,
    update_keys: ITEM_KEYS,
    key_sets: &[],
    urls: &[
        (Endpoint::Item, "/items/{item_id}.json"),
        (Endpoint::Items, "/items.json"),
        (Endpoint::Create, "/items.json"),
    ],
    fields: &[
        FieldDescriptor::cast("name", CastKind::String),
        FieldDescriptor::cast("description", CastKind::String),
        FieldDescriptor::cast("unit_price", CastKind::String),
        FieldDescriptor::cast("unit", CastKind::String),
        FieldDescriptor::cast("quantity", CastKind::String),
        FieldDescriptor::nested("tax", EntityKind::Tax),
    ],
};

const TAX_KEYS: &[&str] = &["tax", "name", "value", "region", "default_tax"];

pub static TAX: EntitySchema = EntitySchema {
    kind: EntityKind::Tax,
    container: Some("tax"),
    create_container: None,
    id_field: "id",
    identifier: Some("tax_id"),
    type_identifier: None,
    create_keys: TAX_KEYS,
    update_keys: TAX_KEYS,
    key_sets: &[("item", &["name"])],
    urls: &[
        (Endpoint::Item, "/taxes/{tax_id}.json"),
        (Endpoint::Items, "/taxes.json"),
        (Endpoint::Create, "/taxes.json"),
    ],
    fields: &[
        FieldDescriptor::cast("value", CastKind::String),
        FieldDescriptor::cast("default_tax", CastKind::Integer),
    ],
};

pub static RECEIPT: EntitySchema = EntitySchema {
    kind: EntityKind::Receipt,
    container: Some("receipt"),
    create_container: Some("partial_payment"),
    id_field: "id",
    identifier: Some("receipt_id"),
    type_identifier: None,
    create_keys: &["payment_mechanism", "note", "serie", "amount", "payment_date"],
    update_keys: &[],
    key_sets: &[("cancel", &["state", "message"])],
    urls: &[
        (Endpoint::Item, "/receipts/{receipt_id}/{action}.json"),
        (Endpoint::Create, "/documents/{document_id}/partial_payments.json"),
    ],
    fields: &[
        FieldDescriptor::cast("payment_mechanism", CastKind::String),
        FieldDescriptor::cast("note", CastKind::String),
        FieldDescriptor::cast("serie", CastKind::String),
        FieldDescriptor::cast("amount", CastKind::Decimal(2)),
        FieldDescriptor::cast("payment_date", CastKind::ToDate),
        FieldDescriptor::nested("client", EntityKind::Client),
        FieldDescriptor::list("items", EntityKind::InvoiceItem),
        FieldDescriptor::nested("invoice", EntityKind::Invoice),
    ],
};

pub static EMAIL: EntitySchema = EntitySchema {
    kind: EntityKind::Email,
    container: Some("message"),
    create_container: None,
    id_field: "id",
    identifier: None,
    type_identifier: None,
    create_keys: &["client", "subject", "body", "cc", "bcc", "logo"],
    update_keys: &["client", "subject", "body", "cc", "bcc", "logo"],
    key_sets: &[("client", &["email", "save"])],
    urls: &[],
    fields: &[FieldDescriptor::cast("logo", CastKind::Integer)],
};
