#![cfg(feature = "integration")]
/// Integration tests for the InvoiceXpress SDK against a live sandbox account.
///
/// These tests require network access and real credentials in
/// INVOICEXPRESS_ACCOUNT and INVOICEXPRESS_API_KEY. They create documents on
/// the account, so point them at a sandbox.
/// Run with: cargo test --features integration --test integration_tests -- --test-threads=1
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;
use rust_decimal_macros::dec;
use serial_test::serial;
use tokio::sync::OnceCell;

use invoicexpress_sdk::*;

static SHARED_CLIENT: OnceCell<Client> = OnceCell::const_new();

fn sdk() -> InvoiceXpressClient {
    let account = std::env::var("INVOICEXPRESS_ACCOUNT").expect("INVOICEXPRESS_ACCOUNT not set");
    let api_key = std::env::var("INVOICEXPRESS_API_KEY").expect("INVOICEXPRESS_API_KEY not set");
    InvoiceXpressClient::new(Auth::new(account, api_key).unwrap()).unwrap()
}

fn unique_code(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

/// One client shared by every document test.
async fn shared_client() -> &'static Client {
    SHARED_CLIENT
        .get_or_init(|| async {
            let mut customer = Client::new();
            customer
                .set_name("SDK Integration Customer")
                .set_code(unique_code("sdk"))
                .set_email("integration@example.com")
                .set_country("Portugal");
            sdk().save_client(&mut customer).await.unwrap();
            customer
        })
        .await
}

async fn draft_invoice(doc_type: DocumentType) -> Invoice {
    let mut tax = Tax::new();
    tax.set_name("IVA23");
    let mut item = InvoiceItem::new();
    item.set_name("Integration service")
        .set_unit_price(dec!(10))
        .set_quantity(dec!(1))
        .set_tax(&tax);

    let today = Local::now().date_naive();
    let mut invoice = Invoice::of_type(doc_type);
    invoice
        .set_date(today)
        .set_due_date(today)
        .set_client(shared_client().await)
        .add_item(item);
    sdk().save_invoice(&mut invoice).await.unwrap();
    invoice
}

/// Poll the PDF endpoint until the service has rendered the document.
async fn pdf_with_retry(client: &InvoiceXpressClient, invoice: &Invoice, max_retries: usize) -> String {
    for attempt in 0..max_retries {
        match client.invoice_pdf(invoice, false).await {
            Ok(url) => return url,
            Err(InvoiceXpressError::WaitingPdf) if attempt < max_retries - 1 => {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            Err(e) => panic!("invoice_pdf failed: {e}"),
        }
    }
    unreachable!()
}

#[tokio::test]
#[serial]
async fn test_list_taxes() {
    let taxes = sdk().taxes().await.unwrap();
    assert!(!taxes.is_empty(), "Account should have at least one tax");
    assert!(taxes.items.iter().all(|t| t.name().is_some()));
}

#[tokio::test]
#[serial]
async fn test_client_round_trip() {
    let customer = shared_client().await;
    assert!(customer.is_created());

    let code = customer.code().unwrap();
    let found = sdk().find_client_by_code(&code).await.unwrap();
    assert_eq!(found.name(), customer.name());
}

#[tokio::test]
#[serial]
async fn test_client_update() {
    let client = sdk();
    let mut customer = shared_client().await.clone();
    customer.set_city("Porto");
    client.save_client(&mut customer).await.unwrap();
    assert_eq!(customer.city().as_deref(), Some("Porto"));
}

#[tokio::test]
#[serial]
async fn test_invoice_lifecycle() {
    let client = sdk();
    let mut invoice = draft_invoice(DocumentType::Invoice).await;
    assert!(invoice.is_created());
    assert_eq!(invoice.status(), Some(DocumentStatus::Draft));

    client.finalize_invoice(&mut invoice).await.unwrap();
    assert_eq!(invoice.status(), Some(DocumentStatus::Final));

    let url = pdf_with_retry(&client, &invoice, 6).await;
    assert!(url.starts_with("http"));

    let mut receipt = Receipt::new();
    receipt
        .set_amount(dec!(12.30))
        .set_payment_date(Local::now().date_naive())
        .set_invoice(&invoice);
    client.save_receipt(&mut receipt).await.unwrap();
    assert!(receipt.is_created());

    let related = client.related_documents(&invoice).await.unwrap();
    assert!(related
        .items
        .iter()
        .any(|d| d.document_type() == Some(DocumentType::Receipt)));

    let receipt_id = receipt.id().unwrap();
    let canceled = client.cancel_receipt(&receipt_id, "Integration test").await.unwrap();
    assert_eq!(canceled.id(), Some(receipt_id));
}

#[tokio::test]
#[serial]
async fn test_invoice_receipt_settles_from_draft() {
    let client = sdk();
    let mut invoice = draft_invoice(DocumentType::InvoiceReceipt).await;
    let code = client.settle_invoice(&mut invoice).await.unwrap();
    assert_eq!(code, TransitionCode::Finalized);
    assert!(!invoice.can_create_receipt());
}

#[tokio::test]
#[serial]
async fn test_delete_draft() {
    let client = sdk();
    let mut invoice = draft_invoice(DocumentType::Invoice).await;
    let code = client.delete_invoice(&mut invoice).await.unwrap();
    assert_eq!(code, TransitionCode::Deleted);
}

#[tokio::test]
#[serial]
async fn test_invalid_credentials_rejected() {
    let client = InvoiceXpressClient::new(Auth::new("no-such-account-sdk", "bogus").unwrap()).unwrap();
    let err = client.taxes().await.unwrap_err();
    assert!(
        err.status_code().is_some() || matches!(err, InvoiceXpressError::HttpError(_)),
        "unexpected error: {err:?}"
    );
}
