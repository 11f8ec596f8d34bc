use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::Row;

use rfq_core::domain::quote_request::{
    BudgetRange, Certification, LineItem, QuoteDraft, QuoteRequestId, QuoteRequestStatus,
    SubmittedQuoteRequest, Timeline,
};
use rfq_core::submission::{QuoteSubmissionSink, SubmissionError, SubmissionReceipt};

use super::{decode_err, QuoteRequestRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRequestRepository {
    pool: DbPool,
}

impl SqlQuoteRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_children(
        &self,
        id: &str,
    ) -> Result<(Vec<LineItem>, BTreeSet<Certification>), RepositoryError> {
        let line_items = sqlx::query(
            "SELECT product_ref, quantity, specifications
             FROM quote_request_line_item
             WHERE quote_request_id = ?
             ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<LineItem, RepositoryError> {
            Ok(LineItem {
                product_ref: row.try_get("product_ref").map_err(decode_err)?,
                quantity: row.try_get("quantity").map_err(decode_err)?,
                specifications: row.try_get("specifications").map_err(decode_err)?,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

        let certifications = sqlx::query(
            "SELECT certification FROM quote_request_certification WHERE quote_request_id = ?",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<Certification, RepositoryError> {
            let name: String = row.try_get("certification").map_err(decode_err)?;
            name.parse::<Certification>().map_err(decode_err)
        })
        .collect::<Result<BTreeSet<_>, RepositoryError>>()?;

        Ok((line_items, certifications))
    }

    async fn hydrate(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<SubmittedQuoteRequest, RepositoryError> {
        let id: String = row.try_get("id").map_err(decode_err)?;
        let status: String = row.try_get("status").map_err(decode_err)?;
        let timeline: String = row.try_get("timeline").map_err(decode_err)?;
        let budget: Option<String> = row.try_get("budget").map_err(decode_err)?;
        let submitted_at: String = row.try_get("submitted_at").map_err(decode_err)?;

        let status = match status.as_str() {
            "pending" => QuoteRequestStatus::Pending,
            other => return Err(RepositoryError::Decode(format!("unknown status `{other}`"))),
        };
        let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(decode_err)?;
        let (line_items, certifications) = self.load_children(&id).await?;

        let draft = QuoteDraft {
            customer_name: row.try_get("customer_name").map_err(decode_err)?,
            company: row.try_get("company").map_err(decode_err)?,
            email: row.try_get("email").map_err(decode_err)?,
            phone: row.try_get("phone").map_err(decode_err)?,
            project_name: row.try_get("project_name").map_err(decode_err)?,
            timeline: Some(timeline.parse::<Timeline>().map_err(decode_err)?),
            budget: budget.map(|value| value.parse::<BudgetRange>()).transpose().map_err(decode_err)?,
            line_items,
            requirements: row.try_get("requirements").map_err(decode_err)?,
            certifications,
            delivery_address: row.try_get("delivery_address").map_err(decode_err)?,
            special_instructions: row.try_get("special_instructions").map_err(decode_err)?,
        };

        Ok(SubmittedQuoteRequest { id: QuoteRequestId(id), status, submitted_at, draft })
    }
}

const SELECT_QUOTE_REQUEST: &str = "SELECT id, status, customer_name, company, email, phone,
        project_name, timeline, budget, requirements, delivery_address,
        special_instructions, submitted_at
 FROM quote_request";

#[async_trait::async_trait]
impl QuoteRequestRepository for SqlQuoteRequestRepository {
    async fn find_by_id(
        &self,
        id: &QuoteRequestId,
    ) -> Result<Option<SubmittedQuoteRequest>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_QUOTE_REQUEST} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, request: &SubmittedQuoteRequest) -> Result<(), RepositoryError> {
        let draft = &request.draft;
        let timeline = draft
            .timeline
            .map(|timeline| timeline.as_str())
            .ok_or_else(|| RepositoryError::Decode("quote request has no timeline".to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quote_request (id, status, customer_name, company, email, phone,
                                        project_name, timeline, budget, requirements,
                                        delivery_address, special_instructions, submitted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id.0)
        .bind(request.status.as_str())
        .bind(&draft.customer_name)
        .bind(&draft.company)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.project_name)
        .bind(timeline)
        .bind(draft.budget.map(|budget| budget.as_str()))
        .bind(&draft.requirements)
        .bind(&draft.delivery_address)
        .bind(&draft.special_instructions)
        .bind(request.submitted_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (position, item) in draft.line_items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quote_request_line_item
                     (quote_request_id, position, product_ref, quantity, specifications)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&request.id.0)
            .bind(position as i64)
            .bind(&item.product_ref)
            .bind(&item.quantity)
            .bind(&item.specifications)
            .execute(&mut *tx)
            .await?;
        }

        for certification in &draft.certifications {
            sqlx::query(
                "INSERT INTO quote_request_certification (quote_request_id, certification)
                 VALUES (?, ?)",
            )
            .bind(&request.id.0)
            .bind(certification.name())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl QuoteSubmissionSink for SqlQuoteRequestRepository {
    async fn create(&self, draft: &QuoteDraft) -> Result<SubmissionReceipt, SubmissionError> {
        let request = SubmittedQuoteRequest::pending(draft.clone());
        self.insert(&request).await.map_err(|error| match error {
            RepositoryError::Decode(message) => SubmissionError::Rejected(message),
            RepositoryError::Database(error) => SubmissionError::Unavailable(error.to_string()),
        })?;

        Ok(SubmissionReceipt { id: request.id.0, submitted_at: request.submitted_at })
    }
}
