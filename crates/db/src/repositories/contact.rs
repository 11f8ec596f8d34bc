use chrono::{DateTime, Utc};
use sqlx::Row;

use rfq_core::domain::contact::{ContactMessage, ContactMessageId, SubmittedContactMessage};
use rfq_core::submission::{ContactMessageSink, SubmissionError, SubmissionReceipt};

use super::{decode_err, ContactMessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlContactMessageRepository {
    pool: DbPool,
}

impl SqlContactMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<SubmittedContactMessage, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let submitted_at: String = row.try_get("submitted_at").map_err(decode_err)?;
    let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(decode_err)?;

    Ok(SubmittedContactMessage {
        id: ContactMessageId(id),
        submitted_at,
        message: ContactMessage {
            name: row.try_get("name").map_err(decode_err)?,
            email: row.try_get("email").map_err(decode_err)?,
            company: row.try_get("company").map_err(decode_err)?,
            phone: row.try_get("phone").map_err(decode_err)?,
            message: row.try_get("message").map_err(decode_err)?,
        },
    })
}

#[async_trait::async_trait]
impl ContactMessageRepository for SqlContactMessageRepository {
    async fn find_by_id(
        &self,
        id: &ContactMessageId,
    ) -> Result<Option<SubmittedContactMessage>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, company, phone, message, submitted_at
             FROM contact_message WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_message(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, message: &SubmittedContactMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO contact_message (id, name, email, company, phone, message, submitted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id.0)
        .bind(&message.message.name)
        .bind(&message.message.email)
        .bind(&message.message.company)
        .bind(&message.message.phone)
        .bind(&message.message.message)
        .bind(message.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ContactMessageSink for SqlContactMessageRepository {
    async fn create(&self, message: &ContactMessage) -> Result<SubmissionReceipt, SubmissionError> {
        let submitted = SubmittedContactMessage::new(message.clone());
        self.insert(&submitted)
            .await
            .map_err(|error| SubmissionError::Unavailable(error.to_string()))?;

        Ok(SubmissionReceipt { id: submitted.id.0, submitted_at: submitted.submitted_at })
    }
}

#[cfg(test)]
mod tests {
    use rfq_core::domain::contact::{ContactMessage, ContactMessageId};
    use rfq_core::submission::ContactMessageSink;

    use super::SqlContactMessageRepository;
    use crate::repositories::ContactMessageRepository;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn contact_message_is_stored() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlContactMessageRepository::new(pool);

        let message = ContactMessage {
            name: "Tomasz Wilk".to_string(),
            email: "tomasz@wilk-tooling.example".to_string(),
            company: "Wilk Tooling".to_string(),
            phone: String::new(),
            message: "Do you anodize in-house?".to_string(),
        };
        let receipt = repo.create(&message).await.expect("create");
        assert!(receipt.id.starts_with("CM-"));

        let stored = repo
            .find_by_id(&ContactMessageId(receipt.id))
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored.message, message);
    }
}
