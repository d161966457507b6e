//! CSV invoice ledger import.
//!
//! Expected header: `invoice_id,customer_id,amount,amount_paid,issue_date,due_date,paid_date,
//! status,disputed`. Rows are grouped per customer, ordered by customer id, with each customer's
//! invoices kept in file order.

mod parser;

use crate::scoring::validation::invoice_issue;
use crate::scoring::{CustomerBillingProfile, CustomerId, Invoice, ValidationIssue};
use parser::LedgerRow;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LedgerImportError {
    #[error("failed to read invoice ledger: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid invoice ledger CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("ledger line {line}{}: {issue}", invoice_suffix(.invoice_id))]
    Record {
        line: u64,
        invoice_id: Option<String>,
        issue: ValidationIssue,
    },
}

fn invoice_suffix(invoice_id: &Option<String>) -> String {
    invoice_id
        .as_deref()
        .map(|id| format!(" (invoice {id})"))
        .unwrap_or_default()
}

pub struct InvoiceLedgerImporter;

impl InvoiceLedgerImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<CustomerBillingProfile>, LedgerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CustomerBillingProfile>, LedgerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut grouped: BTreeMap<CustomerId, Vec<Invoice>> = BTreeMap::new();
        let mut rows = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let row: LedgerRow = record.deserialize(Some(&headers))?;
            let invoice_id = row.invoice_id.clone();

            let invoice = row
                .into_invoice()
                .and_then(|invoice| match invoice_issue(&invoice) {
                    Some(issue) => Err(issue),
                    None => Ok(invoice),
                })
                .map_err(|issue| LedgerImportError::Record {
                    line,
                    invoice_id,
                    issue,
                })?;

            grouped
                .entry(invoice.customer_id.clone())
                .or_default()
                .push(invoice);
            rows += 1;
        }

        debug!(rows, customers = grouped.len(), "invoice ledger imported");

        Ok(grouped
            .into_iter()
            .map(|(customer_id, invoices)| CustomerBillingProfile::new(customer_id, invoices))
            .collect())
    }
}
