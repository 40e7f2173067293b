use anyhow::anyhow;

use crate::domain::{AccountId, Summary, summarize_expenses};

use super::{AppError, LedgerStore};

/// Per-category spending totals, recomputed from the ledger on every call.
#[derive(Clone)]
pub struct AggregationEngine {
    ledger: LedgerStore,
}

impl AggregationEngine {
    pub fn new(ledger: LedgerStore) -> Self {
        Self { ledger }
    }

    pub async fn summarize(&self, owner: AccountId) -> Result<Summary, AppError> {
        let expenses = self.ledger.list(owner).await?;
        // Stored amounts are capped, so this only fails on a corrupt ledger
        summarize_expenses(&expenses).map_err(|e| {
            AppError::Storage(anyhow!("cannot total expenses for {}: {}", owner, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::application::ManualClock;
    use crate::domain::Amount;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_summary_tracks_deletes() {
        let ledger = LedgerStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        let engine = AggregationEngine::new(ledger.clone());
        let owner = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let rent = ledger
            .add(owner, "800.00".parse().unwrap(), "rent", None, day)
            .await
            .unwrap();
        ledger
            .add(owner, "12.40".parse().unwrap(), "food", None, day)
            .await
            .unwrap();

        let before = engine.summarize(owner).await.unwrap();
        assert_eq!(before.overall_total.cents(), 81240);

        ledger.delete(owner, rent).await.unwrap();
        let after = engine.summarize(owner).await.unwrap();
        assert!(!after.by_category.contains_key("rent"));
        assert_eq!(after.overall_total, "12.40".parse::<Amount>().unwrap());
    }

    #[tokio::test]
    async fn test_summary_for_owner_without_expenses_is_empty() {
        let ledger = LedgerStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        let summary = AggregationEngine::new(ledger)
            .summarize(Uuid::new_v4())
            .await
            .unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.overall_total, Amount::ZERO);
    }
}
