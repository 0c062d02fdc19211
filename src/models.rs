/// Typed entities for the InvoiceXpress API.
///
/// Each model wraps an [`Entity`] of its kind and exposes builder-style
/// setters (returning `&mut Self`) plus typed getters. Everything still flows
/// through the schema casts, so a model and the generic mapper always agree on
/// wire representation.
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cast::{CastError, DATE_FORMAT};
use crate::document::{DocumentStatus, DocumentType};
use crate::entity::{record, Entity, Record};
use crate::errors::InvoiceXpressError;
use crate::mapper::Mapper;
use crate::schema::{EntityKind, CLIENT_INVOICE_KEYS};
use crate::value::FieldValue;

/// Generates a text getter and a builder setter per field.
macro_rules! text_fields {
    ($($getter:ident, $setter:ident => $key:literal;)*) => {
        $(
            pub fn $getter(&self) -> Option<String> {
                self.0.text($key)
            }

            pub fn $setter(&mut self, value: impl Into<String>) -> &mut Self {
                self.0.put($key, value.into());
                self
            }
        )*
    };
}

fn date_field(entity: &Entity, key: &str) -> Option<NaiveDate> {
    let text = entity.text(key)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An InvoiceXpress account (the tenant owning clients and documents).
#[derive(Debug, Clone, PartialEq)]
pub struct Account(Entity);
record!(Account, EntityKind::Account);

impl Account {
    text_fields! {
        first_name, set_first_name => "first_name";
        last_name, set_last_name => "last_name";
        organization_name, set_organization_name => "organization_name";
        phone, set_phone => "phone";
        email, set_email => "email";
        password, set_password => "password";
        fiscal_id, set_fiscal_id => "fiscal_id";
        tax_country, set_tax_country => "tax_country";
        language, set_language => "language";
    }

    pub fn set_terms(&mut self, accepted: bool) -> &mut Self {
        self.0.put("terms", i64::from(accepted));
        self
    }

    pub fn terms(&self) -> bool {
        self.0.boolean("terms").unwrap_or(false)
    }

    pub fn set_marketing(&mut self, accepted: bool) -> &mut Self {
        self.0.put("marketing", i64::from(accepted));
        self
    }

    pub fn marketing(&self) -> bool {
        self.0.boolean("marketing").unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// How many document copies are emailed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendOptions {
    OneDocument = 1,
    TwoDocuments = 2,
    ThreeDocuments = 3,
}

impl SendOptions {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SendOptions::OneDocument),
            2 => Some(SendOptions::TwoDocuments),
            3 => Some(SendOptions::ThreeDocuments),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Client(Entity);
record!(Client, EntityKind::Client);

impl Client {
    /// Fields embedded when a client is attached to an invoice.
    pub const INVOICE_KEYS: &'static [&'static str] = CLIENT_INVOICE_KEYS;

    text_fields! {
        name, set_name => "name";
        code, set_code => "code";
        email, set_email => "email";
        language, set_language => "language";
        address, set_address => "address";
        city, set_city => "city";
        postal_code, set_postal_code => "postal_code";
        country, set_country => "country";
        fiscal_id, set_fiscal_id => "fiscal_id";
        website, set_website => "website";
        phone, set_phone => "phone";
        fax, set_fax => "fax";
        observations, set_observations => "observations";
    }

    pub fn set_send_options(&mut self, options: SendOptions) -> &mut Self {
        self.0.put("send_options", options as i64);
        self
    }

    pub fn send_options(&self) -> Option<SendOptions> {
        self.0.integer("send_options").and_then(SendOptions::from_code)
    }

    pub fn set_currency_id(&mut self, currency_id: i64) -> &mut Self {
        self.0.put("currency_id", currency_id);
        self
    }

    pub fn currency_id(&self) -> Option<i64> {
        self.0.integer("currency_id")
    }

    pub fn set_preferred_contact(&mut self, contact: PreferredContact) -> &mut Self {
        self.0.store("preferred_contact", contact.into());
        self
    }

    pub fn preferred_contact(&self) -> Option<PreferredContact> {
        self.0
            .entity("preferred_contact")
            .cloned()
            .map(PreferredContact::from_entity)
    }

    /// The client reduced to [`Client::INVOICE_KEYS`].
    pub fn invoice_projection(&self) -> Client {
        Client(self.0.project(Self::INVOICE_KEYS))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferredContact(Entity);
record!(PreferredContact, EntityKind::PreferredContact);

impl PreferredContact {
    text_fields! {
        name, set_name => "name";
        email, set_email => "email";
        phone, set_phone => "phone";
    }
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

/// Portuguese VAT exemption codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxExemption {
    M00,
    M01,
    M02,
    M03,
    M04,
    M05,
    M06,
    M07,
    M08,
    M09,
    M10,
    M11,
    M12,
    M13,
    M14,
    M15,
    M16,
    M99,
}

const EXEMPTIONS: [(TaxExemption, &str, &str); 18] = [
    (TaxExemption::M00, "M00", "Não Aplicavel"),
    (TaxExemption::M01, "M01", "Artigo 16.º n.º 6 alínea c) do CIVA"),
    (
        TaxExemption::M02,
        "M02",
        "Artigo 6.º do Decreto‐Lei n.º 198/90, de 19 de Junho",
    ),
    (TaxExemption::M03, "M03", "Exigibilidade de caixa"),
    (TaxExemption::M04, "M04", "Isento Artigo 13.º do CIVA"),
    (TaxExemption::M05, "M05", "Isento Artigo 14.º do CIVA"),
    (TaxExemption::M06, "M06", "Isento Artigo 15.º do CIVA"),
    (TaxExemption::M07, "M07", "Isento Artigo 9.º do CIVA"),
    (TaxExemption::M08, "M08", "IVA – Autoliquidação"),
    (TaxExemption::M09, "M09", "IVA ‐ não confere direito a dedução"),
    (TaxExemption::M10, "M10", "IVA – Regime de isenção"),
    (TaxExemption::M11, "M11", "Regime particular do tabaco"),
    (
        TaxExemption::M12,
        "M12",
        "Regime da margem de lucro – Agências de Viagens",
    ),
    (
        TaxExemption::M13,
        "M13",
        "Regime da margem de lucro – Bens em segunda mão",
    ),
    (
        TaxExemption::M14,
        "M14",
        "Regime da margem de lucro – Objetos de arte",
    ),
    (
        TaxExemption::M15,
        "M15",
        "Regime da margem de lucro – Objetos de coleção e antiguidades",
    ),
    (
        TaxExemption::M16,
        "M16",
        "Isento Artigo 14.º do RITI",
    ),
    (TaxExemption::M99, "M99", "Não sujeito; não tributado (ou similar)"),
];

impl TaxExemption {
    fn entry(self) -> &'static (TaxExemption, &'static str, &'static str) {
        &EXEMPTIONS[self as usize]
    }

    pub fn code(self) -> &'static str {
        self.entry().1
    }

    /// Legal text printed on the document.
    pub fn description(self) -> &'static str {
        self.entry().2
    }
}

impl fmt::Display for TaxExemption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TaxExemption {
    type Err = InvoiceXpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EXEMPTIONS
            .iter()
            .find(|(_, code, _)| *code == s)
            .map(|(e, _, _)| *e)
            .ok_or_else(|| InvoiceXpressError::Other(format!("unknown tax exemption code: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxRegion {
    #[serde(rename = "PT")]
    Portugal,
    #[serde(rename = "PT-AC")]
    Azores,
    #[serde(rename = "PT-MA")]
    Madeira,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl TaxRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxRegion::Portugal => "PT",
            TaxRegion::Azores => "PT-AC",
            TaxRegion::Madeira => "PT-MA",
            TaxRegion::Unknown => "Unknown",
        }
    }
}

impl FromStr for TaxRegion {
    type Err = InvoiceXpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PT" => Ok(TaxRegion::Portugal),
            "PT-AC" => Ok(TaxRegion::Azores),
            "PT-MA" => Ok(TaxRegion::Madeira),
            "Unknown" => Ok(TaxRegion::Unknown),
            other => Err(InvoiceXpressError::Other(format!("unknown tax region: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tax(Entity);
record!(Tax, EntityKind::Tax);

impl Tax {
    /// Name of the zero-rate tax attached to exempt items.
    pub const ZERO_TAX_NAME: &'static str = "TAX0";

    text_fields! {
        name, set_name => "name";
        value, set_value => "value";
    }

    pub fn set_rate(&mut self, rate: Decimal) -> &mut Self {
        self.0.put("value", rate);
        self
    }

    pub fn set_region(&mut self, region: TaxRegion) -> &mut Self {
        self.0.put("region", region.as_str());
        self
    }

    pub fn region(&self) -> Option<TaxRegion> {
        self.0.text("region").and_then(|r| r.parse().ok())
    }

    pub fn set_default_tax(&mut self, default: bool) -> &mut Self {
        self.0.put("default_tax", default);
        self
    }

    pub fn is_default_tax(&self) -> bool {
        self.0.boolean("default_tax").unwrap_or(false)
    }

    /// The zero-rate tax used when exporting.
    pub fn zero() -> Tax {
        let mut tax = Tax::new();
        tax.set_name(Self::ZERO_TAX_NAME)
            .set_value("0")
            .set_default_tax(false)
            .set_region(TaxRegion::Unknown);
        tax
    }

    /// Tax reduced to the fields an invoice item embeds.
    pub fn item_projection(&self) -> Tax {
        Tax(self.0.project(self.0.schema().keys("item")))
    }
}

// ---------------------------------------------------------------------------
// Invoice items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Service,
    Unit,
    Hour,
    Day,
    Month,
    Other,
}

impl UnitType {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitType::Service => "service",
            UnitType::Unit => "unit",
            UnitType::Hour => "hour",
            UnitType::Day => "day",
            UnitType::Month => "month",
            UnitType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceItem(Entity);
record!(InvoiceItem, EntityKind::InvoiceItem);

impl InvoiceItem {
    text_fields! {
        name, set_name => "name";
        description, set_description => "description";
        unit, set_unit_name => "unit";
    }

    pub fn set_unit(&mut self, unit: UnitType) -> &mut Self {
        self.0.put("unit", unit.as_str());
        self
    }

    pub fn set_unit_price(&mut self, price: Decimal) -> &mut Self {
        self.0.put("unit_price", price);
        self
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.0.text("unit_price").and_then(|p| p.parse().ok())
    }

    pub fn set_quantity(&mut self, quantity: Decimal) -> &mut Self {
        self.0.put("quantity", quantity);
        self
    }

    pub fn quantity(&self) -> Option<Decimal> {
        self.0.text("quantity").and_then(|q| q.parse().ok())
    }

    pub fn set_discount(&mut self, discount: Decimal) -> &mut Self {
        self.0.put("discount", discount);
        self
    }

    /// Attach a tax. Only its name is embedded, as in `{"tax":{"name":"IVA23"}}`.
    pub fn set_tax(&mut self, tax: &Tax) -> &mut Self {
        self.0.store("tax", tax.item_projection().into());
        self
    }

    pub fn tax(&self) -> Option<Tax> {
        self.0.entity("tax").cloned().map(Tax::from_entity)
    }

    pub fn tax_name(&self) -> Option<String> {
        self.0.entity("tax").and_then(|t| t.text("name"))
    }
}

// ---------------------------------------------------------------------------
// Invoice
// ---------------------------------------------------------------------------

/// Read-side `mb_reference` objects are routed into `mb_reference_details`.
/// Scalars go through the field's `string` cast, so the `"1"` flag written by
/// [`Invoice::enable_mb_reference`] reads back unchanged.
pub(crate) fn apply_mb_reference(entity: &mut Entity, value: &Value) -> Result<(), CastError> {
    if value.is_object() {
        entity.store("mb_reference_details", FieldValue::Json(value.clone()));
        entity.set("mb_reference", true)?;
    } else {
        debug!("models.apply_mb_reference scalar={}", value);
        entity.set("mb_reference", value)?;
    }
    Ok(())
}

/// An invoice-family document: invoice, simplified invoice, invoice-receipt,
/// VAT MOSS invoice, credit note or debit note.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice(Entity);
record!(Invoice, EntityKind::Invoice);

impl Invoice {
    /// An empty document of the given type.
    pub fn of_type(doc_type: DocumentType) -> Self {
        let mut invoice = Self::new();
        invoice.set_document_type(doc_type);
        invoice
    }

    text_fields! {
        reference, set_reference => "reference";
        observations, set_observations => "observations";
        retention, set_retention => "retention";
        tax_exemption_reason, set_tax_exemption_reason => "tax_exemption_reason";
        owner_invoice_id, set_owner_invoice_id => "owner_invoice_id";
        currency_code, set_currency_code => "currency_code";
        sequence_number, set_sequence_number => "sequence_number";
        inverted_sequence_number, set_inverted_sequence_number => "inverted_sequence_number";
        permalink, set_permalink => "permalink";
        saft_hash, set_saft_hash => "saft_hash";
    }

    // -- document type ----------------------------------------------------

    /// Type used for request paths. Stored as the plural spelling.
    pub fn set_document_type(&mut self, doc_type: DocumentType) -> &mut Self {
        self.0.put("type_internal", doc_type.plural());
        self
    }

    /// The document type reported by the service (`type`), falling back to the
    /// type chosen locally.
    pub fn document_type(&self) -> Option<DocumentType> {
        if let Some(display) = self.0.text("type") {
            if let Ok(t) = DocumentType::from_display(&display) {
                return Some(t);
            }
        }
        self.0
            .text("type_internal")
            .and_then(|plural| DocumentType::from_plural(&plural).ok())
    }

    /// Document type, or an ordinary invoice when none was set.
    pub fn document_type_or_default(&self) -> DocumentType {
        self.document_type().unwrap_or(DocumentType::Invoice)
    }

    pub fn type_display(&self) -> Option<String> {
        self.0.text("type")
    }

    pub fn can_create_receipt(&self) -> bool {
        self.document_type_or_default().can_create_receipt()
    }

    // -- status -----------------------------------------------------------

    pub fn status(&self) -> Option<DocumentStatus> {
        self.0.text("status").and_then(|s| s.parse().ok())
    }

    pub fn set_status(&mut self, status: DocumentStatus) -> &mut Self {
        self.0.put("status", status.as_str());
        self
    }

    pub fn is_archived(&self) -> bool {
        self.0.boolean("archived").unwrap_or(false)
    }

    // -- dates ------------------------------------------------------------

    pub fn set_date(&mut self, date: NaiveDate) -> &mut Self {
        self.0.put("date", date);
        self
    }

    pub fn date(&self) -> Option<NaiveDate> {
        date_field(&self.0, "date")
    }

    pub fn set_due_date(&mut self, date: NaiveDate) -> &mut Self {
        self.0.put("due_date", date);
        self
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        date_field(&self.0, "due_date")
    }

    // -- numbering --------------------------------------------------------

    pub fn set_sequence_id(&mut self, sequence_id: i64) -> &mut Self {
        self.0.put("sequence_id", sequence_id);
        self
    }

    pub fn sequence_id(&self) -> Option<i64> {
        self.0.integer("sequence_id")
    }

    pub fn set_manual_sequence_number(&mut self, number: i64) -> &mut Self {
        self.0.put("manual_sequence_number", number);
        self
    }

    pub fn set_rate(&mut self, rate: Decimal) -> &mut Self {
        self.0.put("rate", rate);
        self
    }

    pub fn rate(&self) -> Option<Decimal> {
        self.0.text("rate").and_then(|r| r.parse().ok())
    }

    // -- taxes ------------------------------------------------------------

    pub fn set_tax_exemption(&mut self, exemption: TaxExemption) -> &mut Self {
        self.0.put("tax_exemption", exemption.code());
        self
    }

    pub fn tax_exemption(&self) -> Option<TaxExemption> {
        self.0.text("tax_exemption").and_then(|c| c.parse().ok())
    }

    /// Intra-community export: exemption M16 and zero VAT on every item.
    pub fn exporting_to_europe(&mut self) -> &mut Self {
        self.set_tax_exemption(TaxExemption::M16)
            .set_tax_exemption_reason("Exporting to Europe");
        self.remove_vat_from_items();
        self
    }

    /// Export outside the EU: exemption M05 and zero VAT on every item.
    pub fn exporting_to_world(&mut self) -> &mut Self {
        self.set_tax_exemption(TaxExemption::M05)
            .set_tax_exemption_reason("Exporting to Rest of the World");
        self.remove_vat_from_items();
        self
    }

    fn remove_vat_from_items(&mut self) {
        let zero = Tax::zero();
        if let Some(FieldValue::List(items)) = self.0.get_mut("items") {
            for item in items.iter_mut() {
                if let Some(entity) = item.as_entity_mut() {
                    entity.store("tax", zero.item_projection().into());
                }
            }
        }
    }

    // -- Multibanco -------------------------------------------------------

    pub fn enable_mb_reference(&mut self) -> &mut Self {
        self.0.put("mb_reference", true);
        self
    }

    pub fn disable_mb_reference(&mut self) -> &mut Self {
        self.0.put("mb_reference", false);
        self
    }

    pub fn mb_reference(&self) -> bool {
        self.0.boolean("mb_reference").unwrap_or(false)
    }

    /// Payment reference details returned by the service.
    pub fn mb_reference_details(&self) -> Option<&Value> {
        match self.0.get("mb_reference_details")? {
            FieldValue::Json(v) => Some(v),
            _ => None,
        }
    }

    // -- client and items -------------------------------------------------

    /// Attach a client, keeping only the fields an invoice embeds.
    pub fn set_client(&mut self, client: &Client) -> &mut Self {
        self.0.store("client", client.invoice_projection().into());
        self
    }

    pub fn client(&self) -> Option<Client> {
        self.0.entity("client").cloned().map(Client::from_entity)
    }

    pub fn add_item(&mut self, item: InvoiceItem) -> &mut Self {
        let element = FieldValue::from(item);
        match self.0.get_mut("items") {
            Some(FieldValue::List(items)) => items.push(element),
            _ => {
                self.0.store("items", FieldValue::List(vec![element]));
            }
        }
        self
    }

    pub fn clear_items(&mut self) -> &mut Self {
        self.0.store("items", FieldValue::List(Vec::new()));
        self
    }

    pub fn items(&self) -> Vec<InvoiceItem> {
        self.0
            .entities("items")
            .into_iter()
            .cloned()
            .map(InvoiceItem::from_entity)
            .collect()
    }

    // -- totals (read only) -----------------------------------------------

    pub fn sum(&self) -> Option<f64> {
        self.0.float("sum")
    }

    pub fn discount(&self) -> Option<f64> {
        self.0.float("discount")
    }

    pub fn before_taxes(&self) -> Option<f64> {
        self.0.float("before_taxes")
    }

    pub fn taxes(&self) -> Option<f64> {
        self.0.float("taxes")
    }

    pub fn total(&self) -> Option<f64> {
        self.0.float("total")
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// A payment receipt issued against an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt(Entity);
record!(Receipt, EntityKind::Receipt);

impl Receipt {
    text_fields! {
        payment_mechanism, set_payment_mechanism => "payment_mechanism";
        note, set_note => "note";
        serie, set_serie => "serie";
        sequence_number, set_sequence_number => "sequence_number";
        permalink, set_permalink => "permalink";
    }

    pub fn set_amount(&mut self, amount: Decimal) -> &mut Self {
        self.0.put("amount", amount);
        self
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self.0.get("amount")? {
            FieldValue::Decimal(d) => Some(d.into_inner()),
            other => other.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        }
    }

    pub fn set_payment_date(&mut self, date: NaiveDate) -> &mut Self {
        self.0.put("payment_date", date);
        self
    }

    pub fn payment_date(&self) -> Option<NaiveDate> {
        date_field(&self.0, "payment_date")
    }

    pub fn status(&self) -> Option<DocumentStatus> {
        self.0.text("status").and_then(|s| s.parse().ok())
    }

    /// Attach the invoice being paid. Its id, when known, becomes `invoice_id`.
    pub fn set_invoice(&mut self, invoice: &Invoice) -> &mut Self {
        self.0.store("invoice", invoice.clone().into());
        if let Some(id) = invoice.entity().id().cloned() {
            self.0.put("invoice_id", id);
        }
        self
    }

    pub fn invoice(&self) -> Option<Invoice> {
        self.0.entity("invoice").cloned().map(Invoice::from_entity)
    }

    pub fn invoice_id(&self) -> Option<String> {
        self.0.text("invoice_id")
    }

    pub fn client(&self) -> Option<Client> {
        self.0.entity("client").cloned().map(Client::from_entity)
    }

    pub fn total(&self) -> Option<f64> {
        self.0.float("total")
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// An email delivery request for a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Email(Entity);
record!(Email, EntityKind::Email);

impl Email {
    text_fields! {
        subject, set_subject => "subject";
        body, set_body => "body";
        cc, set_cc => "cc";
        bcc, set_bcc => "bcc";
    }

    /// Recipient taken from the client's email. `save` stores the address on
    /// the client.
    pub fn set_client(&mut self, client: &Client, save: bool) -> &mut Self {
        let mut recipient = client.entity().only(self.0.schema().keys("client"));
        recipient.insert("save".to_string(), Value::from(i64::from(save)));
        self.0.store("client", FieldValue::Json(Value::Object(recipient)));
        self
    }

    pub fn recipient(&self) -> Option<String> {
        match self.0.get("client")? {
            FieldValue::Json(v) => v.get("email").and_then(Value::as_str).map(str::to_string),
            FieldValue::Entity(e) => e.text("email"),
            _ => None,
        }
    }

    pub fn set_logo(&mut self, attach: bool) -> &mut Self {
        self.0.put("logo", attach);
        self
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Entities that expose the standard item CRUD endpoints.
pub trait Resource: Record {
    /// Key holding the items in a list response.
    const LIST_KEY: &'static str;
}

impl Resource for Client {
    const LIST_KEY: &'static str = "clients";
}

impl Resource for Tax {
    const LIST_KEY: &'static str = "taxes";
}

impl Resource for InvoiceItem {
    const LIST_KEY: &'static str = "items";
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub total_entries: u32,
}

impl<T> Page<T> {
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn next_page(&self) -> u32 {
        if self.has_next_page() {
            self.current_page + 1
        } else {
            self.current_page
        }
    }

    pub fn previous_page(&self) -> u32 {
        self.current_page.saturating_sub(1).max(1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Record> Page<T> {
    /// Decode a list body: items under `items_key`, pagination on the top level
    /// (or under `pagination` when the service nests it).
    pub fn from_body(body: &Value, items_key: &str) -> Result<Self, InvoiceXpressError> {
        let entities = match body.get(items_key) {
            Some(list) => Mapper::standard().list_from(T::KIND, list)?,
            None => Vec::new(),
        };
        let items = entities.into_iter().map(T::from_entity).collect();
        Ok(page_with(items, body))
    }
}

fn page_with<T>(items: Vec<T>, body: &Value) -> Page<T> {
    let number = |key: &str| -> Option<u32> {
        let v = body
            .get(key)
            .or_else(|| body.get("pagination").and_then(|p| p.get(key)))?;
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .and_then(|n| u32::try_from(n).ok())
    };
    let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
    Page {
        current_page: number("current_page").unwrap_or(1),
        total_pages: number("total_pages").unwrap_or(1),
        per_page: number("per_page").unwrap_or(len),
        total_entries: number("total_entries").unwrap_or(len),
        items,
    }
}

/// A document returned by the related-documents endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Invoice(Invoice),
    Receipt(Receipt),
}

impl Document {
    pub fn document_type(&self) -> Option<DocumentType> {
        match self {
            Document::Invoice(invoice) => invoice.document_type(),
            Document::Receipt(_) => Some(DocumentType::Receipt),
        }
    }

    /// Entries typed `Receipt` become receipts, any other type an invoice.
    /// Entries without a type are skipped.
    pub fn list_from(body: &Value) -> Result<Page<Document>, InvoiceXpressError> {
        let mapper = Mapper::standard();
        let mut documents = Vec::new();
        if let Some(Value::Array(entries)) = body.get("documents") {
            for entry in entries {
                let doc = match entry.get("type").and_then(Value::as_str) {
                    Some("Receipt") => {
                        Document::Receipt(Receipt::from_entity(mapper.from_fields(EntityKind::Receipt, entry)?))
                    }
                    Some(_) => {
                        Document::Invoice(Invoice::from_entity(mapper.from_fields(EntityKind::Invoice, entry)?))
                    }
                    None => {
                        debug!("models.document_list skipped untyped entry");
                        continue;
                    }
                };
                documents.push(doc);
            }
        }
        Ok(page_with(documents, body))
    }
}

/// How [`find_client`](crate::api::InvoiceXpressApi::find_client) matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Code,
    Name,
}

impl SearchType {
    pub fn query_key(self) -> &'static str {
        match self {
            SearchType::Code => "client_code",
            SearchType::Name => "client_name",
        }
    }
}

impl FromStr for SearchType {
    type Err = InvoiceXpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(SearchType::Code),
            "name" => Ok(SearchType::Name),
            other => Err(InvoiceXpressError::InvalidSearchType(other.to_string())),
        }
    }
}
