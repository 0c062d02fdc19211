/// REST API client for InvoiceXpress.
///
/// Typed wrappers for every endpoint the SDK covers. Each call builds an
/// [`ApiRequest`] from the schema registry's URL templates, injects the
/// account credentials and hands it to a [`Transport`].
use log::debug;
use serde_json::{Map, Value};

use crate::config::{Auth, ClientConfig};
use crate::document::{DocumentType, TransitionCode};
use crate::entity::Record;
use crate::errors::InvoiceXpressError;
use crate::mapper::Mapper;
use crate::models::*;
use crate::schema::{EntityKind, EntitySchema, Endpoint};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::value::FieldValue;

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Low-level REST API client for InvoiceXpress.
#[derive(Debug, Clone)]
pub struct InvoiceXpressApi<T: Transport = HttpTransport> {
    transport: T,
    auth: Option<Auth>,
}

impl InvoiceXpressApi<HttpTransport> {
    /// Create an API client over HTTP with the given configuration.
    pub fn new(config: ClientConfig, auth: Auth) -> Result<Self, InvoiceXpressError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
            auth: Some(auth),
        })
    }

    /// An API client with no credentials. Every remote call fails with
    /// `InvalidAuth` until credentials are attached.
    pub fn without_auth(config: ClientConfig) -> Result<Self, InvoiceXpressError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
            auth: None,
        })
    }
}

impl<T: Transport> InvoiceXpressApi<T> {
    pub fn with_transport(transport: T, auth: Option<Auth>) -> Self {
        Self { transport, auth }
    }

    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = Some(auth);
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attach the account host variable and API key.
    fn authorize(&self, request: ApiRequest) -> Result<ApiRequest, InvoiceXpressError> {
        let auth = self.auth.as_ref().ok_or(InvoiceXpressError::InvalidAuth)?;
        Ok(request
            .var("account_name", auth.account_name())
            .query("api_key", auth.api_key()))
    }

    /// Send an authenticated request. Non-2xx responses become `InvalidResponse`.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, InvoiceXpressError> {
        let request = self.authorize(request)?;
        let response = self.transport.send(&request).await?;
        debug!(
            "api.execute method={} template={} status={}",
            request.method, request.url_template, response.status
        );
        if !response.is_ok() {
            debug!(
                "api.execute non_success status={} body={:?}",
                response.status, response.body
            );
            return Err(response.into_error());
        }
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Generic resources (clients, taxes, items)
    // -----------------------------------------------------------------------

    /// GET a single resource by id.
    pub async fn get<R: Resource>(&self, id: &str) -> Result<R, InvoiceXpressError> {
        let schema = R::KIND.schema();
        debug!("api.get kind={} id={}", R::KIND, id);
        let request = ApiRequest::get(schema.url(Endpoint::Item)?).var(identifier(schema)?, id);
        let response = self.execute(request).await?;
        let mut entity = Mapper::standard().from_payload(R::KIND, response.body_or_null())?;
        entity.set_id(id_value(id));
        Ok(R::from_entity(entity))
    }

    /// POST a new resource, then fetch it by the id the service assigned.
    pub async fn create<R: Resource>(&self, record: &R) -> Result<R, InvoiceXpressError> {
        let schema = R::KIND.schema();
        debug!("api.create kind={}", R::KIND);
        let request =
            ApiRequest::post(schema.url(Endpoint::Create)?).json(Mapper::create_body(record.entity()));
        let response = self.execute(request).await?;
        let id = created_id(&response, schema)?;
        self.get(&id).await
    }

    /// PUT the update-whitelisted fields and merge the reply with local fields.
    pub async fn update<R: Resource>(&self, record: &R) -> Result<R, InvoiceXpressError> {
        let schema = R::KIND.schema();
        let id = require_id(record)?;
        debug!("api.update kind={} id={}", R::KIND, id);
        let request = ApiRequest::put(schema.url(Endpoint::Item)?)
            .var(identifier(schema)?, &id)
            .json(Mapper::update_body(record.entity()));
        let response = self.execute(request).await?;
        merged(&response, record, &id)
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> Result<(), InvoiceXpressError> {
        let schema = R::KIND.schema();
        debug!("api.delete kind={} id={}", R::KIND, id);
        let request = ApiRequest::delete(schema.url(Endpoint::Item)?).var(identifier(schema)?, id);
        self.execute(request).await?;
        Ok(())
    }

    /// GET one page of a resource list.
    pub async fn list<R: Resource>(&self, page: u32, per_page: u32) -> Result<Page<R>, InvoiceXpressError> {
        let schema = R::KIND.schema();
        debug!(
            "api.list kind={} page={} per_page={}",
            R::KIND, page, per_page
        );
        let request = ApiRequest::get(schema.url(Endpoint::Items)?)
            .query("page", page)
            .query("per_page", per_page);
        let response = self.execute(request).await?;
        Page::from_body(response.body_or_null(), R::LIST_KEY)
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// GET /clients.json
    pub async fn list_clients(&self, page: u32, per_page: u32) -> Result<Page<Client>, InvoiceXpressError> {
        self.list::<Client>(page, per_page).await
    }

    /// GET /clients/find-by-code.json or /clients/find-by-name.json
    pub async fn find_client(&self, query: &str, search: SearchType) -> Result<Client, InvoiceXpressError> {
        debug!("api.find_client search={:?} query={}", search, query);
        let endpoint = match search {
            SearchType::Code => Endpoint::SearchByCode,
            SearchType::Name => Endpoint::SearchByName,
        };
        let request =
            ApiRequest::get(EntityKind::Client.schema().url(endpoint)?).query(search.query_key(), query);
        let response = self.execute(request).await?;
        Client::from_payload(response.body_or_null())
    }

    /// GET /clients/{client_id}/invoices.json
    pub async fn client_invoices(
        &self,
        client_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Invoice>, InvoiceXpressError> {
        debug!(
            "api.client_invoices client_id={} page={} per_page={}",
            client_id, page, per_page
        );
        let schema = EntityKind::Client.schema();
        let request = ApiRequest::get(schema.url(Endpoint::ClientInvoices)?)
            .var(identifier(schema)?, client_id)
            .query("page", page)
            .query("per_page", per_page);
        let response = self.execute(request).await?;
        Page::from_body(response.body_or_null(), "invoices")
    }

    // -----------------------------------------------------------------------
    // Taxes
    // -----------------------------------------------------------------------

    /// GET /taxes.json
    pub async fn list_taxes(&self) -> Result<Page<Tax>, InvoiceXpressError> {
        debug!("api.list_taxes");
        let request = ApiRequest::get(EntityKind::Tax.schema().url(Endpoint::Items)?);
        let response = self.execute(request).await?;
        Page::from_body(response.body_or_null(), Tax::LIST_KEY)
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// GET /api/accounts/{account_id}/get.json
    pub async fn get_account(&self, account_id: &str) -> Result<Account, InvoiceXpressError> {
        debug!("api.get_account account_id={}", account_id);
        let schema = EntityKind::Account.schema();
        let request = ApiRequest::get(schema.url(Endpoint::Item)?)
            .var(identifier(schema)?, account_id)
            .var("action", "get");
        let response = self.execute(request).await?;
        let mut account = Account::from_payload(response.body_or_null())?;
        account.set_id(id_value(account_id));
        Ok(account)
    }

    /// POST /api/accounts/create.json, or create_already_user.json when the
    /// owner already has an InvoiceXpress login.
    pub async fn create_account(&self, account: &Account, existing_user: bool) -> Result<Account, InvoiceXpressError> {
        let action = if existing_user {
            "create_already_user"
        } else {
            "create"
        };
        debug!("api.create_account action={}", action);
        let schema = EntityKind::Account.schema();
        let request = ApiRequest::post(schema.url(Endpoint::Items)?)
            .var("action", action)
            .json(Mapper::create_body(account.entity()));
        let response = self.execute(request).await?;
        let id = created_id(&response, schema)?;
        self.get_account(&id).await
    }

    /// PUT /api/accounts/{account_id}/update.json
    pub async fn update_account(&self, account: &Account) -> Result<Account, InvoiceXpressError> {
        let id = require_id(account)?;
        debug!("api.update_account account_id={}", id);
        let schema = EntityKind::Account.schema();
        let request = ApiRequest::put(schema.url(Endpoint::Item)?)
            .var(identifier(schema)?, &id)
            .var("action", "update")
            .json(Mapper::update_body(account.entity()));
        let response = self.execute(request).await?;
        merged(&response, account, &id)
    }

    // -----------------------------------------------------------------------
    // Invoices
    // -----------------------------------------------------------------------

    /// GET /{document_type}/{document_id}.json
    ///
    /// The reply is wrapped in the singular spelling of the document type.
    pub async fn get_invoice(&self, id: &str, doc_type: DocumentType) -> Result<Invoice, InvoiceXpressError> {
        debug!(
            "api.get_invoice id={} document_type={}",
            id,
            doc_type.plural()
        );
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::get(schema.url(Endpoint::Item)?)
            .var(type_identifier(schema)?, doc_type.plural())
            .var(identifier(schema)?, id);
        let response = self.execute(request).await?;
        let fields = response.get(doc_type.singular()).unwrap_or(&Value::Null);
        let mut invoice = Invoice::from_fields(fields)?;
        invoice.set_id(id_value(id));
        invoice.set_document_type(doc_type);
        Ok(invoice)
    }

    /// POST /{document_type}.json, then fetch the created document.
    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice, InvoiceXpressError> {
        let doc_type = invoice.document_type_or_default();
        debug!("api.create_invoice document_type={}", doc_type.plural());
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::post(schema.url(Endpoint::Create)?)
            .var(type_identifier(schema)?, doc_type.plural())
            .json(Mapper::create_body(invoice.entity()));
        let response = self.execute(request).await?;
        let id = response
            .get(doc_type.singular())
            .and_then(|fields| fields.get("id"))
            .and_then(id_text)
            .ok_or_else(|| {
                InvoiceXpressError::MalformedPayload(format!(
                    "create reply has no {}.id",
                    doc_type.singular()
                ))
            })?;
        self.get_invoice(&id, doc_type).await
    }

    /// PUT /{document_type}/{document_id}.json, then refetch.
    pub async fn update_invoice(&self, invoice: &Invoice) -> Result<Invoice, InvoiceXpressError> {
        let id = require_id(invoice)?;
        let doc_type = invoice.document_type_or_default();
        debug!(
            "api.update_invoice id={} document_type={}",
            id,
            doc_type.plural()
        );
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::put(schema.url(Endpoint::Item)?)
            .var(type_identifier(schema)?, doc_type.plural())
            .var(identifier(schema)?, &id)
            .json(Mapper::update_body(invoice.entity()));
        self.execute(request).await?;
        self.get_invoice(&id, doc_type).await
    }

    /// GET /invoices.json
    pub async fn list_invoices(&self, page: u32, per_page: u32) -> Result<Page<Invoice>, InvoiceXpressError> {
        debug!("api.list_invoices page={} per_page={}", page, per_page);
        let request = ApiRequest::get(EntityKind::Invoice.schema().url(Endpoint::Items)?)
            .query("page", page)
            .query("per_page", per_page);
        let response = self.execute(request).await?;
        Page::from_body(response.body_or_null(), "invoices")
    }

    /// PUT /{document_type}/{document_id}/change-state.json, then refetch.
    ///
    /// `code` is the wire transition code, not the target status. Use
    /// [`check_transition`](crate::document::check_transition) to derive it.
    pub async fn change_invoice_state(
        &self,
        invoice: &Invoice,
        code: TransitionCode,
        message: &str,
    ) -> Result<Invoice, InvoiceXpressError> {
        let id = require_id(invoice)?;
        let doc_type = invoice.document_type_or_default();
        debug!(
            "api.change_invoice_state id={} document_type={} code={}",
            id,
            doc_type.plural(),
            code
        );
        let schema = EntityKind::Invoice.schema();
        let mut fields = Map::new();
        fields.insert("state".to_string(), Value::from(code.as_str()));
        fields.insert("message".to_string(), Value::from(message));
        fields.retain(|key, _| schema.keys("change_state").contains(&key.as_str()));
        let body = Mapper::wrap(container(schema)?, fields);
        let request = ApiRequest::put(schema.url(Endpoint::ItemAction)?)
            .var(type_identifier(schema)?, doc_type.plural())
            .var(identifier(schema)?, &id)
            .var("action", "change-state")
            .json(body);
        self.execute(request).await?;
        self.get_invoice(&id, doc_type).await
    }

    /// PUT /{document_type}/{document_id}/email-document.json
    pub async fn send_invoice_email(&self, invoice: &Invoice, email: &Email) -> Result<(), InvoiceXpressError> {
        let id = require_id(invoice)?;
        let doc_type = invoice.document_type_or_default();
        debug!(
            "api.send_invoice_email id={} document_type={}",
            id,
            doc_type.plural()
        );
        let invoice_schema = EntityKind::Invoice.schema();
        let email_schema = EntityKind::Email.schema();
        let request = ApiRequest::put(invoice_schema.url(Endpoint::ItemAction)?)
            .var(type_identifier(invoice_schema)?, doc_type.plural())
            .var(identifier(invoice_schema)?, &id)
            .var("action", "email-document")
            .json(Mapper::wrap(container(email_schema)?, email.entity().to_map()));
        self.execute(request).await?;
        Ok(())
    }

    /// GET /document/{document_id}/related_documents.json
    pub async fn related_documents(&self, document_id: &str) -> Result<Page<Document>, InvoiceXpressError> {
        debug!("api.related_documents document_id={}", document_id);
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::get(schema.url(Endpoint::Documents)?)
            .var(identifier(schema)?, document_id)
            .var("action", "related_documents");
        let response = self.execute(request).await?;
        Document::list_from(response.body_or_null())
    }

    /// GET /api/pdf/{document_id}.json
    ///
    /// Returns the PDF URL, or `WaitingPdf` while the service is still
    /// rendering it (HTTP 202).
    pub async fn invoice_pdf(&self, document_id: &str, second_copy: bool) -> Result<String, InvoiceXpressError> {
        debug!(
            "api.invoice_pdf document_id={} second_copy={}",
            document_id, second_copy
        );
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::get(schema.url(Endpoint::Pdf)?)
            .var(identifier(schema)?, document_id)
            .query("second_copy", second_copy);
        let response = self.execute(request).await?;
        pdf_url(response, "output.pdfUrl")
    }

    /// GET /pdf/start/{document_id}/{second_copy}
    pub async fn invoice_pdf_download(
        &self,
        document_id: &str,
        second_copy: bool,
    ) -> Result<String, InvoiceXpressError> {
        debug!(
            "api.invoice_pdf_download document_id={} second_copy={}",
            document_id, second_copy
        );
        let schema = EntityKind::Invoice.schema();
        let request = ApiRequest::get(schema.url(Endpoint::PdfDownload)?)
            .var(identifier(schema)?, document_id)
            .var("second_copy", second_copy);
        let response = self.execute(request).await?;
        pdf_url(response, "pdfUrl")
    }

    // -----------------------------------------------------------------------
    // Receipts
    // -----------------------------------------------------------------------

    /// POST /documents/{document_id}/partial_payments.json
    ///
    /// Only invoices, simplified invoices and VAT MOSS invoices accept
    /// receipts.
    pub async fn create_receipt(&self, invoice: &Invoice, receipt: &Receipt) -> Result<Receipt, InvoiceXpressError> {
        invoice.document_type_or_default().ensure_can_create_receipt()?;
        let id = require_id(invoice)?;
        debug!("api.create_receipt document_id={}", id);
        let invoice_schema = EntityKind::Invoice.schema();
        let request = ApiRequest::post(EntityKind::Receipt.schema().url(Endpoint::Create)?)
            .var(identifier(invoice_schema)?, &id)
            .json(Mapper::create_body(receipt.entity()));
        let response = self.execute(request).await?;
        Receipt::from_payload(response.body_or_null())
    }

    /// PUT /receipts/{receipt_id}/change-state.json with state `canceled`.
    pub async fn cancel_receipt(&self, receipt_id: &str, message: &str) -> Result<Receipt, InvoiceXpressError> {
        debug!("api.cancel_receipt receipt_id={}", receipt_id);
        let schema = EntityKind::Receipt.schema();
        let mut fields = Map::new();
        fields.insert("state".to_string(), Value::from("canceled"));
        fields.insert("message".to_string(), Value::from(message));
        fields.retain(|key, _| schema.keys("cancel").contains(&key.as_str()));
        let request = ApiRequest::put(schema.url(Endpoint::Item)?)
            .var(identifier(schema)?, receipt_id)
            .var("action", "change-state")
            .json(Mapper::wrap(container(schema)?, fields));
        let response = self.execute(request).await?;
        let mut receipt = Receipt::from_payload(response.body_or_null())?;
        if receipt.id().is_none() {
            receipt.set_id(id_value(receipt_id));
        }
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn identifier(schema: &EntitySchema) -> Result<&'static str, InvoiceXpressError> {
    schema
        .identifier
        .ok_or_else(|| InvoiceXpressError::Other(format!("{} has no URL identifier", schema.kind)))
}

fn type_identifier(schema: &EntitySchema) -> Result<&'static str, InvoiceXpressError> {
    schema
        .type_identifier
        .ok_or_else(|| InvoiceXpressError::Other(format!("{} has no type identifier", schema.kind)))
}

fn container(schema: &EntitySchema) -> Result<&'static str, InvoiceXpressError> {
    schema
        .container
        .ok_or_else(|| InvoiceXpressError::Other(format!("{} has no container", schema.kind)))
}

fn require_id<R: Record>(record: &R) -> Result<String, InvoiceXpressError> {
    record
        .id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| InvoiceXpressError::ObjectMissing(format!("{} id", R::KIND)))
}

/// Ids are numeric on the wire; keep them numeric when they parse.
fn id_value(id: &str) -> FieldValue {
    match id.trim().parse::<i64>() {
        Ok(n) => FieldValue::Integer(n),
        Err(_) => FieldValue::Text(id.to_string()),
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn created_id(response: &ApiResponse, schema: &EntitySchema) -> Result<String, InvoiceXpressError> {
    let container = container(schema)?;
    response
        .get(&format!("{container}.id"))
        .and_then(id_text)
        .ok_or_else(|| InvoiceXpressError::MalformedPayload(format!("create reply has no {container}.id")))
}

/// Server reply overlaid with every local field. The service omits the id, so
/// it is re-attached first.
fn merged<R: Record>(response: &ApiResponse, local: &R, id: &str) -> Result<R, InvoiceXpressError> {
    let mut server = Mapper::standard().from_payload(R::KIND, response.body_or_null())?;
    server.set_id(id_value(id));
    server.overlay(local.entity());
    debug!("api.merged kind={} fields={}", R::KIND, server.len());
    Ok(R::from_entity(server))
}

fn pdf_url(response: ApiResponse, path: &str) -> Result<String, InvoiceXpressError> {
    match response.status {
        202 => Err(InvoiceXpressError::WaitingPdf),
        200 => response
            .get(path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| InvoiceXpressError::MalformedPayload(format!("PDF reply has no {path}"))),
        _ => Err(response.into_error()),
    }
}
