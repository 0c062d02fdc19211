/// Unit tests for the API layer and the high-level client workflows.
///
/// Every test runs against a recording mock transport, so the assertions
/// cover both the requests the SDK builds and how replies are absorbed.
mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use common::{api, client, empty, ok, MockTransport};
use invoicexpress_sdk::api::InvoiceXpressApi;
use invoicexpress_sdk::config::{Auth, DEFAULT_HOST};
use invoicexpress_sdk::document::{DocumentStatus, DocumentType, TransitionCode};
use invoicexpress_sdk::entity::Record;
use invoicexpress_sdk::errors::InvoiceXpressError;
use invoicexpress_sdk::models::*;
use invoicexpress_sdk::transport::{ApiResponse, Method};

fn invoice(doc_type: DocumentType, id: i64, status: DocumentStatus) -> Invoice {
    let mut invoice = Invoice::of_type(doc_type);
    invoice.set_id(id);
    invoice.set_status(status);
    invoice
}

fn var<'a>(request: &'a invoicexpress_sdk::transport::ApiRequest, name: &str) -> Option<&'a str> {
    request.path_variables.get(name).map(String::as_str)
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[test]
fn test_auth_rejects_empty_credentials() {
    assert!(matches!(Auth::new("", "key"), Err(InvoiceXpressError::InvalidCredentials)));
    assert!(matches!(Auth::new("acme", "  "), Err(InvoiceXpressError::InvalidCredentials)));
}

#[tokio::test]
async fn test_calls_without_auth_fail_before_sending() {
    let api = InvoiceXpressApi::with_transport(MockTransport::new(vec![ok(json!({}))]), None);
    let err = api.get::<Client>("1").await.unwrap_err();
    assert!(matches!(err, InvoiceXpressError::InvalidAuth));
    assert!(api.transport().requests().is_empty());
}

#[tokio::test]
async fn test_requests_carry_account_and_api_key() {
    let api = api(vec![ok(json!({"client": {"name": "ACME"}}))]);
    api.get::<Client>("7").await.unwrap();

    let request = api.transport().request(0);
    assert_eq!(request.method, Method::Get);
    assert_eq!(var(&request, "account_name"), Some("acme"));
    assert_eq!(request.query.get("api_key").map(String::as_str), Some("secret-key"));
    assert_eq!(
        request.render_url(DEFAULT_HOST).unwrap(),
        "https://acme.app.invoicexpress.com/clients/7.json"
    );
}

// ---------------------------------------------------------------------------
// Generic resources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_reattaches_numeric_id() {
    let api = api(vec![ok(json!({"client": {"name": "ACME"}}))]);
    let fetched: Client = api.get("7").await.unwrap();
    assert_eq!(fetched.id().as_deref(), Some("7"));
    assert!(fetched.is_created());
}

#[tokio::test]
async fn test_save_client_creates_then_fetches() {
    let sdk = client(vec![
        ApiResponse::new(201, Some(json!({"client": {"id": 99}}))),
        ok(json!({"client": {"name": "ACME", "code": "A1"}})),
    ]);
    let mut customer = Client::new();
    customer.set_name("ACME").set_email("billing@acme.pt");

    sdk.save_client(&mut customer).await.unwrap();

    assert_eq!(customer.id().as_deref(), Some("99"));
    assert_eq!(customer.code().as_deref(), Some("A1"));

    let requests = sdk.api.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].url_template, "/clients.json");
    assert_eq!(
        requests[0].json_body,
        Some(json!({"client": {"name": "ACME", "email": "billing@acme.pt"}}))
    );
    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(var(&requests[1], "client_id"), Some("99"));
}

#[tokio::test]
async fn test_create_without_id_in_reply_is_malformed() {
    let sdk = client(vec![ok(json!({"client": {}}))]);
    let mut customer = Client::new();
    customer.set_name("ACME");
    assert!(matches!(
        sdk.save_client(&mut customer).await,
        Err(InvoiceXpressError::MalformedPayload(_))
    ));
}

#[tokio::test]
async fn test_save_client_updates_and_local_fields_win() {
    let sdk = client(vec![ok(json!({"client": {"name": "Old", "city": "Porto"}}))]);
    let mut customer = Client::new();
    customer.set_id(5).set_name("New");

    sdk.save_client(&mut customer).await.unwrap();

    assert_eq!(customer.name().as_deref(), Some("New"));
    assert_eq!(customer.city().as_deref(), Some("Porto"));
    assert_eq!(customer.id().as_deref(), Some("5"));

    let request = sdk.api.transport().request(0);
    assert_eq!(request.method, Method::Put);
    assert_eq!(var(&request, "client_id"), Some("5"));
    assert_eq!(request.json_body, Some(json!({"client": {"name": "New"}})));
}

#[tokio::test]
async fn test_update_requires_id() {
    let api = api(vec![]);
    let err = api.update(&Tax::new()).await.unwrap_err();
    assert!(matches!(err, InvoiceXpressError::ObjectMissing(ref what) if what == "Tax id"));
}

#[tokio::test]
async fn test_delete_resource() {
    let api = api(vec![empty(200)]);
    api.delete::<Tax>("4").await.unwrap();
    let request = api.transport().request(0);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.render_path().unwrap(), "/taxes/4.json");
}

#[tokio::test]
async fn test_list_clients_paginates() {
    let api = api(vec![ok(json!({
        "clients": [{"name": "A"}, {"name": "B"}],
        "pagination": {"current_page": 2, "total_pages": 2, "per_page": 10, "total_entries": 12}
    }))]);
    let page = api.list_clients(2, 10).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(!page.has_next_page());

    let request = api.transport().request(0);
    assert_eq!(request.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(request.query.get("per_page").map(String::as_str), Some("10"));
}

#[tokio::test]
async fn test_clients_uses_default_page_size() {
    let sdk = client(vec![ok(json!({"clients": []}))]);
    assert!(sdk.clients().await.unwrap().is_empty());
    let request = sdk.api.transport().request(0);
    assert_eq!(request.query.get("per_page").map(String::as_str), Some("30"));
}

#[tokio::test]
async fn test_client_invoices() {
    let api = api(vec![ok(json!({"invoices": [{"id": 1, "status": "final"}]}))]);
    let page = api.client_invoices("3", 1, 30).await.unwrap();
    assert_eq!(page.items[0].status(), Some(DocumentStatus::Final));
    assert_eq!(
        api.transport().request(0).render_path().unwrap(),
        "/clients/3/invoices.json"
    );
}

#[tokio::test]
async fn test_find_client_by_code_and_name() {
    let sdk = client(vec![
        ok(json!({"client": {"id": 3, "name": "ACME", "code": "A1"}})),
        ok(json!({"client": {"id": 3, "name": "ACME"}})),
    ]);
    let found = sdk.find_client_by_code("A1").await.unwrap();
    assert_eq!(found.name().as_deref(), Some("ACME"));
    sdk.find_client_by_name("ACME").await.unwrap();

    let requests = sdk.api.transport().requests();
    assert_eq!(requests[0].url_template, "/clients/find-by-code.json");
    assert_eq!(requests[0].query.get("client_code").map(String::as_str), Some("A1"));
    assert_eq!(requests[1].url_template, "/clients/find-by-name.json");
    assert_eq!(requests[1].query.get("client_name").map(String::as_str), Some("ACME"));
}

#[tokio::test]
async fn test_taxes() {
    let sdk = client(vec![ok(json!({"taxes": [{"name": "IVA23", "value": 23.0}]}))]);
    let taxes = sdk.taxes().await.unwrap();
    assert_eq!(taxes.items[0].name().as_deref(), Some("IVA23"));
    assert_eq!(taxes.items[0].value().as_deref(), Some("23"));
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_account_for_existing_user() {
    let sdk = client(vec![
        ok(json!({"account": {"id": 12}})),
        ok(json!({"account": {"first_name": "Ana"}})),
    ]);
    let mut account = Account::new();
    account.set_first_name("Ana").set_terms(true);

    sdk.save_account(&mut account, true).await.unwrap();
    assert_eq!(account.id().as_deref(), Some("12"));

    let requests = sdk.api.transport().requests();
    assert_eq!(requests[0].render_path().unwrap(), "/api/accounts/create_already_user.json");
    assert_eq!(
        requests[0].json_body,
        Some(json!({"account": {"first_name": "Ana", "terms": "1"}}))
    );
    assert_eq!(requests[1].render_path().unwrap(), "/api/accounts/12/get.json");
}

#[tokio::test]
async fn test_update_account() {
    let sdk = client(vec![ok(json!({"account": {"first_name": "Ana", "language": "en"}}))]);
    let mut account = Account::new();
    account.set_id(12).set_language("pt");

    sdk.save_account(&mut account, false).await.unwrap();
    assert_eq!(account.language().as_deref(), Some("pt"));
    assert_eq!(account.first_name().as_deref(), Some("Ana"));
    assert_eq!(
        sdk.api.transport().request(0).render_path().unwrap(),
        "/api/accounts/12/update.json"
    );
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_invoice_creates_under_singular_key() {
    let sdk = client(vec![
        ok(json!({"invoice_receipt": {"id": 5}})),
        ok(json!({"invoice_receipt": {"id": 5, "status": "draft", "type": "InvoiceReceipt"}})),
    ]);
    let mut customer = Client::new();
    customer.set_name("ACME").set_language("pt");
    let mut document = Invoice::of_type(DocumentType::InvoiceReceipt);
    document.set_reference("PO-1").set_client(&customer);

    sdk.save_invoice(&mut document).await.unwrap();

    assert_eq!(document.id().as_deref(), Some("5"));
    assert_eq!(document.status(), Some(DocumentStatus::Draft));
    assert_eq!(document.document_type(), Some(DocumentType::InvoiceReceipt));

    let requests = sdk.api.transport().requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].render_path().unwrap(), "/invoice_receipts.json");
    assert_eq!(
        requests[0].json_body,
        Some(json!({"invoice": {"reference": "PO-1", "client": {"name": "ACME"}}}))
    );
    assert_eq!(requests[1].render_path().unwrap(), "/invoice_receipts/5.json");
}

#[tokio::test]
async fn test_create_invoice_reply_without_id() {
    let sdk = client(vec![ok(json!({"invoice": {}}))]);
    let mut document = Invoice::of_type(DocumentType::Invoice);
    document.set_reference("PO-1");
    assert!(matches!(
        sdk.save_invoice(&mut document).await,
        Err(InvoiceXpressError::MalformedPayload(_))
    ));
}

#[tokio::test]
async fn test_save_invoice_updates_then_refetches() {
    let sdk = client(vec![
        empty(200),
        ok(json!({"invoice": {"id": 10, "status": "draft", "reference": "PO-2"}})),
    ]);
    let mut document = invoice(DocumentType::Invoice, 10, DocumentStatus::Draft);
    document.set_reference("PO-2");

    sdk.save_invoice(&mut document).await.unwrap();
    assert_eq!(document.reference().as_deref(), Some("PO-2"));

    let requests = sdk.api.transport().requests();
    assert_eq!(requests[0].method, Method::Put);
    assert_eq!(requests[0].render_path().unwrap(), "/invoices/10.json");
    assert_eq!(requests[1].method, Method::Get);
}

#[tokio::test]
async fn test_list_invoices() {
    let api = api(vec![ok(json!({"invoices": [{"id": 1}, {"id": 2}], "total_entries": 2}))]);
    let page = api.list_invoices(1, 30).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[1].id().as_deref(), Some("2"));
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_finalize_sends_finalized_code() {
    let sdk = client(vec![
        empty(200),
        ok(json!({"invoice": {"id": 10, "status": "final", "sequence_number": "1/A"}})),
    ]);
    let mut document = invoice(DocumentType::Invoice, 10, DocumentStatus::Draft);

    let code = sdk.finalize_invoice(&mut document).await.unwrap();
    assert_eq!(code, TransitionCode::Finalized);
    assert_eq!(document.status(), Some(DocumentStatus::Final));
    assert_eq!(document.sequence_number().as_deref(), Some("1/A"));

    let request = sdk.api.transport().request(0);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.render_path().unwrap(), "/invoices/10/change-state.json");
    assert_eq!(
        request.json_body,
        Some(json!({"invoice": {"state": "finalized", "message": "Observations"}}))
    );
}

#[tokio::test]
async fn test_illegal_transition_sends_nothing() {
    let sdk = client(vec![]);
    let mut document = invoice(DocumentType::Invoice, 10, DocumentStatus::Final);

    let err = sdk.finalize_invoice(&mut document).await.unwrap_err();
    assert!(matches!(err, InvoiceXpressError::InvalidStatusUpdate { .. }));
    assert!(sdk.api.transport().requests().is_empty());
    assert_eq!(document.status(), Some(DocumentStatus::Final));
}

#[tokio::test]
async fn test_type_guard_sends_nothing() {
    let sdk = client(vec![]);
    let mut document = invoice(DocumentType::Invoice, 10, DocumentStatus::Draft);

    let err = sdk.settle_invoice(&mut document).await.unwrap_err();
    assert!(matches!(err, InvoiceXpressError::InvalidDocumentType { .. }));
    assert!(sdk.api.transport().requests().is_empty());
}

#[tokio::test]
async fn test_transition_requires_status() {
    let sdk = client(vec![]);
    let mut document = Invoice::of_type(DocumentType::Invoice);
    document.set_id(10);
    assert!(matches!(
        sdk.finalize_invoice(&mut document).await,
        Err(InvoiceXpressError::ObjectMissing(_))
    ));
}

#[tokio::test]
async fn test_cancel_invoice_receipt_with_reason() {
    let sdk = client(vec![
        empty(200),
        ok(json!({"invoice_receipt": {"id": 11, "status": "canceled"}})),
    ]);
    let mut document = invoice(DocumentType::InvoiceReceipt, 11, DocumentStatus::Settled);

    let code = sdk.cancel_invoice(&mut document, "Wrong client").await.unwrap();
    assert_eq!(code, TransitionCode::Canceled);
    assert_eq!(document.status(), Some(DocumentStatus::Canceled));
    assert_eq!(
        sdk.api.transport().request(0).json_body,
        Some(json!({"invoice": {"state": "canceled", "message": "Wrong client"}}))
    );
}

#[tokio::test]
async fn test_unsettle_credit_note() {
    let sdk = client(vec![empty(200), ok(json!({"credit_note": {"id": 12, "status": "final"}}))]);
    let mut note = invoice(DocumentType::CreditNote, 12, DocumentStatus::Settled);

    assert_eq!(sdk.unsettle_invoice(&mut note).await.unwrap(), TransitionCode::Unsettled);
    assert_eq!(note.status(), Some(DocumentStatus::Final));
    assert_eq!(
        sdk.api.transport().request(0).render_path().unwrap(),
        "/credit_notes/12/change-state.json"
    );
}

#[tokio::test]
async fn test_delete_draft() {
    let sdk = client(vec![empty(200), ok(json!({"invoice": {"id": 10, "status": "deleted"}}))]);
    let mut document = invoice(DocumentType::Invoice, 10, DocumentStatus::Draft);
    assert_eq!(sdk.delete_invoice(&mut document).await.unwrap(), TransitionCode::Deleted);
    assert_eq!(document.status(), Some(DocumentStatus::Deleted));
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_receipt_posts_partial_payment() {
    let sdk = client(vec![ok(json!({"receipt": {"id": 77, "status": "final"}}))]);
    let paid = invoice(DocumentType::Invoice, 10, DocumentStatus::Final);
    let mut receipt = Receipt::new();
    receipt.set_amount(dec!(50)).set_invoice(&paid);

    sdk.save_receipt(&mut receipt).await.unwrap();

    assert_eq!(receipt.id().as_deref(), Some("77"));
    assert_eq!(receipt.status(), Some(DocumentStatus::Final));
    assert_eq!(receipt.amount(), Some(dec!(50.00)));

    let request = sdk.api.transport().request(0);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.render_path().unwrap(), "/documents/10/partial_payments.json");
    assert_eq!(request.json_body, Some(json!({"partial_payment": {"amount": "50.00"}})));
}

#[tokio::test]
async fn test_save_receipt_requires_invoice() {
    let sdk = client(vec![]);
    let mut receipt = Receipt::new();
    receipt.set_amount(dec!(50));
    assert!(matches!(
        sdk.save_receipt(&mut receipt).await,
        Err(InvoiceXpressError::ObjectMissing(ref what)) if what == "invoice"
    ));
}

#[tokio::test]
async fn test_receipt_rejected_for_credit_notes() {
    let sdk = client(vec![]);
    let note = invoice(DocumentType::CreditNote, 12, DocumentStatus::Final);
    let err = sdk.create_receipt(&note, &Receipt::new()).await.unwrap_err();
    assert!(matches!(err, InvoiceXpressError::InvalidDocumentType { .. }));
    assert!(sdk.api.transport().requests().is_empty());
}

#[tokio::test]
async fn test_receipt_requires_invoice_id() {
    let sdk = client(vec![]);
    let unsaved = Invoice::of_type(DocumentType::Invoice);
    assert!(matches!(
        sdk.create_receipt(&unsaved, &Receipt::new()).await,
        Err(InvoiceXpressError::ObjectMissing(_))
    ));
}

#[tokio::test]
async fn test_cancel_receipt() {
    let sdk = client(vec![ok(json!({"receipt": {"status": "canceled"}}))]);
    let receipt = sdk.cancel_receipt("77", "Duplicate").await.unwrap();
    assert_eq!(receipt.id().as_deref(), Some("77"));
    assert_eq!(receipt.status(), Some(DocumentStatus::Canceled));

    let request = sdk.api.transport().request(0);
    assert_eq!(request.render_path().unwrap(), "/receipts/77/change-state.json");
    assert_eq!(
        request.json_body,
        Some(json!({"receipt": {"state": "canceled", "message": "Duplicate"}}))
    );
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_send_email() {
    let sdk = client(vec![empty(200)]);
    let sent = invoice(DocumentType::Invoice, 10, DocumentStatus::Final);
    let mut customer = Client::new();
    customer.set_email("billing@acme.pt");
    let mut email = Email::new();
    email.set_client(&customer, true).set_subject("Your invoice");

    sdk.send_email(&sent, &email).await.unwrap();

    let request = sdk.api.transport().request(0);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.render_path().unwrap(), "/invoices/10/email-document.json");
    assert_eq!(
        request.json_body,
        Some(json!({"message": {"client": {"email": "billing@acme.pt", "save": 1}, "subject": "Your invoice"}}))
    );
}

#[tokio::test]
async fn test_related_documents() {
    let sdk = client(vec![ok(json!({"documents": [
        {"id": 20, "type": "Receipt"},
        {"id": 21, "type": "CreditNote"}
    ]}))]);
    let source = invoice(DocumentType::Invoice, 10, DocumentStatus::Settled);

    let page = sdk.related_documents(&source).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(matches!(page.items[0], Document::Receipt(_)));
    assert_eq!(page.items[1].document_type(), Some(DocumentType::CreditNote));
    assert_eq!(
        sdk.api.transport().request(0).render_path().unwrap(),
        "/document/10/related_documents.json"
    );
}

#[tokio::test]
async fn test_pdf_waiting_then_ready() {
    let sdk = client(vec![empty(202), ok(json!({"pdfUrl": "https://cdn.example/10.pdf"}))]);
    let document = invoice(DocumentType::Invoice, 10, DocumentStatus::Final);

    assert!(matches!(
        sdk.invoice_pdf(&document, true).await,
        Err(InvoiceXpressError::WaitingPdf)
    ));
    assert_eq!(
        sdk.invoice_pdf(&document, true).await.unwrap(),
        "https://cdn.example/10.pdf"
    );
    assert_eq!(
        sdk.api.transport().request(0).render_path().unwrap(),
        "/pdf/start/10/true"
    );
}

#[tokio::test]
async fn test_pdf_requires_invoice_id() {
    let sdk = client(vec![]);
    assert!(matches!(
        sdk.invoice_pdf(&Invoice::new(), false).await,
        Err(InvoiceXpressError::ObjectMissing(_))
    ));
}

#[tokio::test]
async fn test_api_pdf_reads_output_url() {
    let api = api(vec![
        ok(json!({"output": {"pdfUrl": "https://cdn.example/10.pdf"}})),
        ok(json!({"output": {}})),
    ]);
    assert_eq!(api.invoice_pdf("10", false).await.unwrap(), "https://cdn.example/10.pdf");
    assert_eq!(
        api.transport().request(0).query.get("second_copy").map(String::as_str),
        Some("false")
    );
    assert!(matches!(
        api.invoice_pdf("10", false).await,
        Err(InvoiceXpressError::MalformedPayload(_))
    ));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_validation_errors_exposed() {
    let sdk = client(vec![ApiResponse::new(
        422,
        Some(json!({"errors": [{"error": "Name can't be blank"}]})),
    )]);
    let mut customer = Client::new();
    customer.set_email("billing@acme.pt");

    let err = sdk.save_client(&mut customer).await.unwrap_err();
    assert_eq!(err.status_code(), Some(422));
    assert_eq!(
        err.validation_errors(),
        Some(&json!({"errors": [{"error": "Name can't be blank"}]}))
    );
    assert!(!customer.is_created());
}

#[tokio::test]
async fn test_server_error_without_body() {
    let api = api(vec![empty(500)]);
    let err = api.get::<Client>("1").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert!(err.body().is_none());
    assert!(err.validation_errors().is_none());
}
