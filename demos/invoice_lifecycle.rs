/// Invoice lifecycle example for InvoiceXpress.
///
/// Creates a client, issues an invoice for it, finalizes the invoice, emails
/// it, waits for the PDF and records a payment receipt.
///
/// Requires INVOICEXPRESS_ACCOUNT and INVOICEXPRESS_API_KEY.
use std::time::Duration;

use chrono::{Days, Local};
use invoicexpress_sdk::*;
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let account = std::env::var("INVOICEXPRESS_ACCOUNT")?;
    let api_key = std::env::var("INVOICEXPRESS_API_KEY")?;
    let client = InvoiceXpressClient::new(Auth::new(account, api_key)?)?;

    // Customer
    let mut customer = Client::new();
    customer
        .set_name("ACME, Lda")
        .set_code("ACME-001")
        .set_email("billing@acme.example")
        .set_fiscal_id("508025338")
        .set_country("Portugal")
        .set_send_options(SendOptions::OneDocument);
    client.save_client(&mut customer).await?;
    println!("Client id: {}", customer.id().unwrap_or_default());

    // Pick the account's default tax, falling back to the first one
    let taxes = client.taxes().await?;
    let tax = taxes
        .items
        .iter()
        .find(|t| t.is_default_tax())
        .or_else(|| taxes.items.first())
        .cloned()
        .ok_or("account has no taxes configured")?;
    println!("Using tax: {}", tax.name().unwrap_or_default());

    let mut item = InvoiceItem::new();
    item.set_name("Consulting")
        .set_description("Architecture review")
        .set_unit(UnitType::Hour)
        .set_unit_price(Decimal::new(6000, 2))
        .set_quantity(Decimal::from(4))
        .set_tax(&tax);

    // Draft invoice
    let today = Local::now().date_naive();
    let mut invoice = Invoice::of_type(DocumentType::Invoice);
    invoice
        .set_date(today)
        .set_due_date(today.checked_add_days(Days::new(30)).unwrap_or(today))
        .set_reference("PO-2024-17")
        .set_client(&customer)
        .add_item(item);
    client.save_invoice(&mut invoice).await?;
    println!(
        "Draft {} created, total {:?}",
        invoice.id().unwrap_or_default(),
        invoice.total()
    );

    // draft -> final
    let code = client.finalize_invoice(&mut invoice).await?;
    println!(
        "Transition '{code}', now {}",
        invoice.status().map(|s| s.to_string()).unwrap_or_default()
    );

    let mut email = Email::new();
    email
        .set_client(&customer, true)
        .set_subject("Your invoice")
        .set_body("Please find your invoice attached.")
        .set_logo(true);
    client.send_email(&invoice, &email).await?;
    println!("Emailed to {}", email.recipient().unwrap_or_default());

    // The PDF is rendered asynchronously
    let pdf = loop {
        match client.invoice_pdf(&invoice, false).await {
            Ok(url) => break url,
            Err(InvoiceXpressError::WaitingPdf) => {
                println!("PDF not ready, retrying...");
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            Err(e) => return Err(e.into()),
        }
    };
    println!("PDF: {pdf}");

    // Record the payment
    let mut receipt = Receipt::new();
    receipt
        .set_amount(Decimal::new(24000, 2))
        .set_payment_date(today)
        .set_payment_mechanism("TB")
        .set_note("Bank transfer")
        .set_invoice(&invoice);
    client.save_receipt(&mut receipt).await?;
    println!("Receipt id: {}", receipt.id().unwrap_or_default());

    let related = client.related_documents(&invoice).await?;
    for document in &related.items {
        match document {
            Document::Receipt(r) => println!("  receipt {}", r.id().unwrap_or_default()),
            Document::Invoice(i) => println!(
                "  {} {}",
                i.type_display().unwrap_or_default(),
                i.id().unwrap_or_default()
            ),
        }
    }

    Ok(())
}
