//! Supabase (PostgREST) implementation of the remote store contract

use std::collections::HashSet;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::models::ReminderId;
use crate::owner::OwnerId;
use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::{RemoteError, RemoteReminder, RemoteStore};

const TABLE: &str = "reminders";

/// Remote store backed by a Supabase `reminders` table
///
/// Row-level security scopes every query to the authenticated owner; the
/// access token is the bearer credential issued at sign-in. The table
/// maintains a `server_updated_at` column via trigger on every write; the
/// watermark query filters on that clock, never on the record's own
/// `updated_at` (which is the device's last-write-wins edit time).
#[derive(Clone)]
pub struct SupabaseRemoteStore {
    rest_url: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl SupabaseRemoteStore {
    pub fn new(
        base_url: impl AsRef<str>,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let rest_url = normalize_base_url(base_url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "access token must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            access_token,
            client: Client::builder().build()?,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.rest_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api(parse_api_error(status, &body), status.as_u16()))
    }
}

impl RemoteStore for SupabaseRemoteStore {
    async fn upsert(&self, record: &RemoteReminder) -> Result<(), RemoteError> {
        let request = self
            .authorized(self.client.post(self.table_url()))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[record]);

        Self::check_response(request.send().await?).await?;
        Ok(())
    }

    async fn mark_deleted(&self, id: &ReminderId) -> Result<(), RemoteError> {
        let request = self
            .authorized(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "deleted": true }));

        Self::check_response(request.send().await?).await?;
        Ok(())
    }

    async fn modified_since(
        &self,
        owner: &OwnerId,
        watermark: Option<i64>,
    ) -> Result<Vec<RemoteReminder>, RemoteError> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("owner_id".to_string(), format!("eq.{owner}")),
            ("deleted".to_string(), "is.false".to_string()),
        ];
        if let Some(watermark) = watermark {
            query.push(("server_updated_at".to_string(), format!("gt.{watermark}")));
        }

        let request = self
            .authorized(self.client.get(self.table_url()))
            .query(&query);

        let response = Self::check_response(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn live_ids(&self, owner: &OwnerId) -> Result<HashSet<ReminderId>, RemoteError> {
        #[derive(Deserialize)]
        struct IdRow {
            id: ReminderId,
        }

        let request = self
            .authorized(self.client.get(self.table_url()))
            .query(&[
                ("select", "id".to_string()),
                ("owner_id", format!("eq.{owner}")),
                ("deleted", "is.false".to_string()),
            ]);

        let response = Self::check_response(request.send().await?).await?;
        let rows: Vec<IdRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.hint) {
            return compact_text(&message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, RemoteError> {
    let url = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
