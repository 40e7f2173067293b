use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::application::{ExpenseView, LedgerService};
use crate::domain::{SessionToken, Summary};

/// Everything one account owns, as written by a JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub expenses: Vec<ExpenseView>,
    pub summary: Summary,
}

/// Exporter for writing an owner's ledger data to CSV or JSON.
/// Every export goes through the facade, so the token is verified first.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export expenses to CSV, newest first.
    pub async fn export_expenses_csv<W: Write>(
        &self,
        token: &SessionToken,
        writer: W,
    ) -> Result<usize> {
        let expenses = self.service.list_expenses(token).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "amount", "category", "description"])?;

        for expense in &expenses {
            csv_writer.write_record([
                expense.id.to_string(),
                expense.date.format("%Y-%m-%d").to_string(),
                expense.amount.to_string(),
                expense.category.clone(),
                expense.description.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export the per-category summary to CSV, largest category first,
    /// followed by a total row.
    pub async fn export_summary_csv<W: Write>(
        &self,
        token: &SessionToken,
        writer: W,
    ) -> Result<usize> {
        let summary = self.service.summary(token).await?;
        write_summary_csv(&summary, writer)
    }

    /// Export expenses and summary as one JSON document.
    pub async fn export_json<W: Write>(&self, token: &SessionToken, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(token).await?;
        let summary = self.service.summary(token).await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: self.service.clock().utc(),
            expenses: expenses.iter().map(ExpenseView::from).collect(),
            summary,
        };

        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(snapshot.expenses.len())
    }
}

/// Write a summary as CSV: one row per category, then a TOTAL row.
/// Returns the number of category rows.
pub fn write_summary_csv<W: Write>(summary: &Summary, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["category", "count", "total"])?;
    for entry in &summary.breakdown {
        csv_writer.write_record([
            entry.category.clone(),
            entry.count.to_string(),
            entry.total.to_string(),
        ])?;
    }
    let count: usize = summary.breakdown.iter().map(|entry| entry.count).sum();
    csv_writer.write_record([
        "TOTAL".to_string(),
        count.to_string(),
        summary.overall_total.to_string(),
    ])?;

    csv_writer.flush()?;
    Ok(summary.breakdown.len())
}
