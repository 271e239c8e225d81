//! Row operations against the REST endpoint (`/rest/v1`).
//!
//! Filters use the `column=op.value` query syntax, e.g. `user_id=eq.42`;
//! ordering is `order=column.asc|desc`.

use crate::error::{ClientError, Result};
use crate::types::error_message;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Sort direction for `order=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Parameters of a select
#[derive(Debug, Clone, Default)]
pub struct Select<'q> {
    columns: Option<&'q str>,
    filters: Vec<(&'q str, String)>,
    order: Option<(&'q str, Order)>,
    limit: Option<u32>,
}

impl<'q> Select<'q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection, `*` when unset
    pub fn columns(mut self, columns: &'q str) -> Self {
        self.columns = Some(columns);
        self
    }

    /// `column = value`
    pub fn eq(mut self, column: &'q str, value: &str) -> Self {
        self.filters.push((column, format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &'q str, order: Order) -> Self {
        self.order = Some((column, order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![(
            "select".to_string(),
            self.columns.unwrap_or("*").to_string(),
        )];
        query.extend(
            self.filters
                .iter()
                .map(|(column, value)| ((*column).to_string(), value.clone())),
        );
        if let Some((column, order)) = self.order {
            let direction = match order {
                Order::Asc => "asc",
                Order::Desc => "desc",
            };
            query.push(("order".to_string(), format!("{}.{}", column, direction)));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }

    fn filters(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|(column, value)| ((*column).to_string(), value.clone()))
            .collect()
    }
}

/// REST client for one request scope.
pub struct RestClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    api_key: &'a str,
    bearer: &'a str,
}

impl<'a> RestClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, api_key: &'a str, bearer: &'a str) -> Self {
        Self {
            http,
            base_url,
            api_key,
            bearer,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.api_key)
            .bearer_auth(self.bearer)
    }

    /// Fetch rows
    pub async fn select<T: DeserializeOwned>(&self, table: &str, select: &Select<'_>) -> Result<Vec<T>> {
        let url = self.table_url(table);
        debug!(url = %url, "Selecting rows");

        let response = self
            .authorized(self.http.get(&url))
            .query(&select.query())
            .send()
            .await
            .map_err(ClientError::transport)?;

        let response = check(response).await?;
        let rows: Vec<T> = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse {} rows: {}", table, e))
        })?;

        debug!(table, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Insert a row without reading it back
    pub async fn insert<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> Result<()> {
        let url = self.table_url(table);
        debug!(url = %url, "Inserting row");

        let response = self
            .authorized(self.http.post(&url))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(ClientError::transport)?;

        check(response).await.map(|_| ())
    }

    /// Insert a row and return the stored representation
    pub async fn insert_returning<B, T>(&self, table: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table);
        debug!(url = %url, "Inserting row");

        let response = self
            .authorized(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let response = check(response).await?;
        let mut rows: Vec<T> = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse inserted {} row: {}", table, e))
        })?;

        if rows.is_empty() {
            return Err(ClientError::ParseError(format!(
                "Insert into {} returned no row",
                table
            )));
        }
        Ok(rows.swap_remove(0))
    }

    /// Delete the rows matching the select's filters
    pub async fn delete(&self, table: &str, filter: &Select<'_>) -> Result<()> {
        let url = self.table_url(table);
        debug!(url = %url, "Deleting rows");

        let response = self
            .authorized(self.http.delete(&url))
            .query(&filter.filters())
            .send()
            .await
            .map_err(ClientError::transport)?;

        check(response).await.map(|_| ())
    }
}

/// Map a non-2xx response to a client error
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(ClientError::AuthRequired),
        404 => Err(ClientError::NotFound(response.url().path().to_string())),
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::RateLimited {
                retry_after_secs: retry_after,
            })
        }
        code => {
            let error_text = response.text().await.unwrap_or_default();
            Err(ClientError::ServerError {
                status: code,
                message: error_message(&error_text),
            })
        }
    }
}
