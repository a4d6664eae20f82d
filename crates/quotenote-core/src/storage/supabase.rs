//! Supabase (PostgREST) implementation of the quote collection.

use std::fmt;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::remote::{QuoteCollection, QuoteDocument};
use crate::error::{Error, Result};
use crate::models::{QuoteId, QuoteInput};
use crate::util::{compact_text, is_http_url};

const QUOTES_TABLE: &str = "quotes";

/// PostgREST client for the `quotes` table.
///
/// Requests carry the project anon key plus the signed-in user's access token,
/// and every query is filtered by `user_id`.
#[derive(Clone)]
pub struct SupabaseQuoteCollection {
    table_url: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl fmt::Debug for SupabaseQuoteCollection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseQuoteCollection")
            .field("table_url", &self.table_url)
            .field("anon_key", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct NewQuoteRow<'a> {
    text: &'a str,
    author: Option<&'a str>,
    tags: &'a [String],
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct QuotePatch<'a> {
    text: &'a str,
    author: Option<&'a str>,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl SupabaseQuoteCollection {
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".into(),
            ));
        }
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase access token must not be empty".into(),
            ));
        }

        Ok(Self {
            table_url: format!("{rest_url}/{QUOTES_TABLE}"),
            anon_key,
            access_token,
            client: Client::builder().build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
    }

    async fn read_rows(response: Response) -> Result<Vec<QuoteDocument>> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }
        Ok(response.json::<Vec<QuoteDocument>>().await?)
    }
}

impl QuoteCollection for SupabaseQuoteCollection {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<QuoteDocument>> {
        let request = self.authorized(self.client.get(&self.table_url).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
        ]));
        Self::read_rows(request.send().await?).await
    }

    async fn insert(&self, user_id: &str, input: &QuoteInput) -> Result<QuoteDocument> {
        let row = NewQuoteRow {
            text: &input.text,
            author: input.author.as_deref(),
            tags: &input.tags,
            user_id,
        };
        let request = self.authorized(
            self.client
                .post(&self.table_url)
                .header("Prefer", "return=representation")
                .json(&row),
        );

        Self::read_rows(request.send().await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Remote("insert did not return the created quote".into()))
    }

    async fn update(
        &self,
        user_id: &str,
        id: &QuoteId,
        input: &QuoteInput,
    ) -> Result<Option<QuoteDocument>> {
        let patch = QuotePatch {
            text: &input.text,
            author: input.author.as_deref(),
            tags: &input.tags,
        };
        let request = self.authorized(
            self.client
                .patch(&self.table_url)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{user_id}")),
                ])
                .header("Prefer", "return=representation")
                .json(&patch),
        );

        Ok(Self::read_rows(request.send().await?).await?.into_iter().next())
    }

    async fn delete(&self, user_id: &str, id: &QuoteId) -> Result<bool> {
        let request = self.authorized(
            self.client
                .delete(&self.table_url)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{user_id}")),
                ])
                .header("Prefer", "return=representation"),
        );

        Ok(!Self::read_rows(request.send().await?).await?.is_empty())
    }
}

/// Turn a project URL into its PostgREST base (`.../rest/v1`)
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Supabase URL must not be empty".into()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".into(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload.message {
            let detail = payload.details.or(payload.hint).unwrap_or_default();
            if detail.trim().is_empty() {
                return format!("{} ({})", message.trim(), status.as_u16());
            }
            return format!("{}: {} ({})", message.trim(), detail.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
