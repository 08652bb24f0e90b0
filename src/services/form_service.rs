use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::response_dto::{ClientInfo, SubmitResponsePayload};
use crate::error::{Error, Result};
use crate::models::field::Field;
use crate::models::form::Form;
use crate::models::response::{Answer, Response};

#[derive(Clone)]
pub struct FormService {
    pool: PgPool,
}

impl FormService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_form(&self, form_id: Uuid) -> Result<Form> {
        sqlx::query_as::<_, Form>("SELECT id, title, description, created_at FROM forms WHERE id = $1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Form {} not found", form_id)))
    }

    pub async fn list_fields(&self, form_id: Uuid) -> Result<Vec<Field>> {
        let rows = sqlx::query_as::<_, Field>(
            r#"SELECT id, form_id, title, field_type, position, required, properties
               FROM fields WHERE form_id = $1 ORDER BY position ASC"#,
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every response of the form with its answers attached.
    pub async fn list_responses(&self, form_id: Uuid) -> Result<Vec<Response>> {
        let mut responses = sqlx::query_as::<_, Response>(
            r#"SELECT id, form_id, respondent_id, completed, time_taken, ip_address,
                      user_agent, created_at, completed_at
               FROM responses WHERE form_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, Answer>(
            r#"SELECT a.id, a.response_id, a.field_id, a.value
               FROM answers a
               JOIN responses r ON r.id = a.response_id
               WHERE r.form_id = $1"#,
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_response: HashMap<Uuid, Vec<Answer>> = HashMap::new();
        for answer in answers {
            by_response.entry(answer.response_id).or_default().push(answer);
        }
        for response in &mut responses {
            response.answers = by_response.remove(&response.id).unwrap_or_default();
        }
        Ok(responses)
    }

    /// Stores a response and its answers in one transaction. Answers for
    /// fields that do not belong to the form are rejected.
    pub async fn submit_response(
        &self,
        form_id: Uuid,
        fields: &[Field],
        payload: SubmitResponsePayload,
        client: ClientInfo,
    ) -> Result<Response> {
        let known: HashSet<Uuid> = fields.iter().map(|f| f.id).collect();
        if let Some(unknown) = payload.answers.iter().find(|a| !known.contains(&a.field_id)) {
            return Err(Error::BadRequest(format!(
                "Field {} does not belong to form {}",
                unknown.field_id, form_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        let mut response = sqlx::query_as::<_, Response>(
            r#"
            INSERT INTO responses (form_id, respondent_id, completed, time_taken, ip_address, user_agent, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $3 THEN NOW() ELSE NULL END)
            RETURNING id, form_id, respondent_id, completed, time_taken, ip_address,
                      user_agent, created_at, completed_at
            "#,
        )
        .bind(form_id)
        .bind(payload.respondent_id)
        .bind(payload.completed)
        .bind(payload.time_taken)
        .bind(client.ip)
        .bind(client.user_agent)
        .fetch_one(&mut *tx)
        .await?;

        for submitted in payload.answers {
            let answer = sqlx::query_as::<_, Answer>(
                r#"INSERT INTO answers (response_id, field_id, value)
                   VALUES ($1, $2, $3)
                   RETURNING id, response_id, field_id, value"#,
            )
            .bind(response.id)
            .bind(submitted.field_id)
            .bind(submitted.value)
            .fetch_one(&mut *tx)
            .await?;
            response.answers.push(answer);
        }

        tx.commit().await?;
        tracing::info!(response_id = %response.id, form_id = %form_id, completed = response.completed, "response stored");
        Ok(response)
    }
}
