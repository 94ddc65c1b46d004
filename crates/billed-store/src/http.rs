use async_trait::async_trait;
use billed_core::Bill;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{BillStore, CreatedBill, ReceiptUpload, StoreError};

/// Async HTTP implementation of `BillStore`.
/// Connects to a running bills backend.
pub struct HttpStore {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            token: None,
        }
    }

    pub fn with_token(base_url: &str, token: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            token: Some(token),
        }
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }
}

#[async_trait]
impl BillStore for HttpStore {
    async fn list_bills(&self) -> Result<Vec<Bill>, StoreError> {
        let builder = self.client.get(format!("{}/bills", self.base_url));
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        handle_response(resp).await
    }

    async fn create_bill(&self, upload: &ReceiptUpload) -> Result<CreatedBill, StoreError> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone()),
            )
            .text("email", upload.email.clone());

        let builder = self
            .client
            .post(format!("{}/bills", self.base_url))
            .multipart(form);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        handle_response(resp).await
    }

    async fn update_bill(&self, key: &str, bill: &Bill) -> Result<Bill, StoreError> {
        let builder = self
            .client
            .patch(format!("{}/bills/{key}", self.base_url))
            .json(bill);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        handle_response(resp).await
    }

    /// Check if the backend is reachable. Not authenticated.
    async fn health_check(&self) -> Result<(), StoreError> {
        let resp = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp.status(), resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, StoreError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| StoreError::Decode(format!("json decode: {e}")))
    } else {
        Err(error_from_response(status, resp).await)
    }
}

async fn error_from_response(status: StatusCode, resp: reqwest::Response) -> StoreError {
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);
    StoreError::Status {
        code: status.as_u16(),
        message,
    }
}
