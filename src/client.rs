/// High-level InvoiceXpressClient that orchestrates the document workflows.
///
/// This is the primary entry point for SDK users. It saves entities (create or
/// update depending on whether they exist remotely), drives invoice status
/// transitions through the state machine, and issues receipts, emails and
/// PDFs. Saved entities absorb the refreshed server state in place.
use log::debug;

use crate::api::{InvoiceXpressApi, DEFAULT_PER_PAGE};
use crate::config::{Auth, ClientConfig};
use crate::document::{check_transition, DocumentStatus, TransitionCode};
use crate::entity::Record;
use crate::errors::InvoiceXpressError;
use crate::models::*;
use crate::transport::{HttpTransport, Transport};

/// Message sent with a status change when the caller gives none.
pub const DEFAULT_STATE_MESSAGE: &str = "Observations";

/// The high-level InvoiceXpress client.
#[derive(Debug, Clone)]
pub struct InvoiceXpressClient<T: Transport = HttpTransport> {
    pub api: InvoiceXpressApi<T>,
}

impl InvoiceXpressClient<HttpTransport> {
    /// Client for `auth`'s account with the default configuration.
    pub fn new(auth: Auth) -> Result<Self, InvoiceXpressError> {
        Self::with_config(ClientConfig::default(), auth)
    }

    pub fn with_config(config: ClientConfig, auth: Auth) -> Result<Self, InvoiceXpressError> {
        Ok(Self {
            api: InvoiceXpressApi::new(config, auth)?,
        })
    }
}

impl<T: Transport> InvoiceXpressClient<T> {
    pub fn from_api(api: InvoiceXpressApi<T>) -> Self {
        Self { api }
    }

    // -----------------------------------------------------------------------
    // Save workflows
    // -----------------------------------------------------------------------

    async fn save_resource<R: Resource>(&self, record: &mut R) -> Result<(), InvoiceXpressError> {
        let saved = if record.is_created() {
            self.api.update(record).await?
        } else {
            self.api.create(record).await?
        };
        record.entity_mut().absorb(saved.into_entity());
        Ok(())
    }

    /// Create the client when it has no id yet, otherwise update it.
    pub async fn save_client(&self, client: &mut Client) -> Result<(), InvoiceXpressError> {
        debug!("client.save_client created={}", client.is_created());
        self.save_resource(client).await
    }

    pub async fn save_tax(&self, tax: &mut Tax) -> Result<(), InvoiceXpressError> {
        debug!("client.save_tax created={}", tax.is_created());
        self.save_resource(tax).await
    }

    pub async fn save_item(&self, item: &mut InvoiceItem) -> Result<(), InvoiceXpressError> {
        debug!("client.save_item created={}", item.is_created());
        self.save_resource(item).await
    }

    /// Create or update an account. `existing_user` selects the endpoint used
    /// when the owner already has a login; it is ignored on update.
    pub async fn save_account(&self, account: &mut Account, existing_user: bool) -> Result<(), InvoiceXpressError> {
        debug!(
            "client.save_account created={} existing_user={}",
            account.is_created(),
            existing_user
        );
        let saved = if account.is_created() {
            self.api.update_account(account).await?
        } else {
            self.api.create_account(account, existing_user).await?
        };
        account.entity_mut().absorb(saved.into_entity());
        Ok(())
    }

    /// Create or update an invoice-family document, then refresh it.
    pub async fn save_invoice(&self, invoice: &mut Invoice) -> Result<(), InvoiceXpressError> {
        debug!(
            "client.save_invoice created={} document_type={}",
            invoice.is_created(),
            invoice.document_type_or_default().plural()
        );
        let saved = if invoice.is_created() {
            self.api.update_invoice(invoice).await?
        } else {
            self.api.create_invoice(invoice).await?
        };
        invoice.entity_mut().absorb(saved.into_entity());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move `invoice` to `target`. The current status and document type are
    /// checked first; nothing is sent when the transition is illegal.
    pub async fn transition(
        &self,
        invoice: &mut Invoice,
        target: DocumentStatus,
        message: Option<&str>,
    ) -> Result<TransitionCode, InvoiceXpressError> {
        let current = invoice
            .status()
            .ok_or_else(|| InvoiceXpressError::ObjectMissing("invoice status".to_string()))?;
        let code = check_transition(current, target, invoice.document_type_or_default())?;
        debug!(
            "client.transition from={} to={} code={}",
            current, target, code
        );
        let refreshed = self
            .api
            .change_invoice_state(invoice, code, message.unwrap_or(DEFAULT_STATE_MESSAGE))
            .await?;
        invoice.entity_mut().absorb(refreshed.into_entity());
        Ok(code)
    }

    /// draft -> final
    pub async fn finalize_invoice(&self, invoice: &mut Invoice) -> Result<TransitionCode, InvoiceXpressError> {
        self.transition(invoice, DocumentStatus::Final, None).await
    }

    /// final -> settled, or draft -> settled for invoice-receipts.
    pub async fn settle_invoice(&self, invoice: &mut Invoice) -> Result<TransitionCode, InvoiceXpressError> {
        self.transition(invoice, DocumentStatus::Settled, None).await
    }

    /// draft -> deleted
    pub async fn delete_invoice(&self, invoice: &mut Invoice) -> Result<TransitionCode, InvoiceXpressError> {
        self.transition(invoice, DocumentStatus::Deleted, None).await
    }

    /// final -> canceled, or settled -> canceled for invoice-receipts. The
    /// service requires a reason.
    pub async fn cancel_invoice(
        &self,
        invoice: &mut Invoice,
        reason: &str,
    ) -> Result<TransitionCode, InvoiceXpressError> {
        self.transition(invoice, DocumentStatus::Canceled, Some(reason)).await
    }

    /// settled -> final, for credit and debit notes.
    pub async fn unsettle_invoice(&self, invoice: &mut Invoice) -> Result<TransitionCode, InvoiceXpressError> {
        self.transition(invoice, DocumentStatus::Final, None).await
    }

    // -----------------------------------------------------------------------
    // Receipts
    // -----------------------------------------------------------------------

    /// Issue `receipt` against `invoice`.
    pub async fn create_receipt(&self, invoice: &Invoice, receipt: &Receipt) -> Result<Receipt, InvoiceXpressError> {
        self.api.create_receipt(invoice, receipt).await
    }

    /// Issue a receipt against the invoice attached to it, absorbing the reply.
    pub async fn save_receipt(&self, receipt: &mut Receipt) -> Result<(), InvoiceXpressError> {
        let invoice = receipt
            .invoice()
            .ok_or_else(|| InvoiceXpressError::ObjectMissing("invoice".to_string()))?;
        debug!("client.save_receipt invoice_id={:?}", invoice.id());
        let created = self.api.create_receipt(&invoice, receipt).await?;
        receipt.entity_mut().overlay(created.entity());
        Ok(())
    }

    pub async fn cancel_receipt(&self, receipt_id: &str, message: &str) -> Result<Receipt, InvoiceXpressError> {
        self.api.cancel_receipt(receipt_id, message).await
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    pub async fn send_email(&self, invoice: &Invoice, email: &Email) -> Result<(), InvoiceXpressError> {
        self.api.send_invoice_email(invoice, email).await
    }

    pub async fn related_documents(&self, invoice: &Invoice) -> Result<Page<Document>, InvoiceXpressError> {
        let id = invoice
            .id()
            .ok_or_else(|| InvoiceXpressError::ObjectMissing("Invoice id".to_string()))?;
        self.api.related_documents(&id).await
    }

    /// URL of the rendered PDF. `WaitingPdf` means the service is still
    /// generating it; try again later.
    pub async fn invoice_pdf(&self, invoice: &Invoice, second_copy: bool) -> Result<String, InvoiceXpressError> {
        let id = invoice
            .id()
            .ok_or_else(|| InvoiceXpressError::ObjectMissing("Invoice id".to_string()))?;
        self.api.invoice_pdf_download(&id, second_copy).await
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub async fn find_client_by_code(&self, code: &str) -> Result<Client, InvoiceXpressError> {
        self.api.find_client(code, SearchType::Code).await
    }

    pub async fn find_client_by_name(&self, name: &str) -> Result<Client, InvoiceXpressError> {
        self.api.find_client(name, SearchType::Name).await
    }

    /// First page of clients at the default page size.
    pub async fn clients(&self) -> Result<Page<Client>, InvoiceXpressError> {
        self.api.list_clients(1, DEFAULT_PER_PAGE).await
    }

    pub async fn taxes(&self) -> Result<Page<Tax>, InvoiceXpressError> {
        self.api.list_taxes().await
    }
}
