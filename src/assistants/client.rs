//! HTTP implementation of the Assistants traits.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::types::ListResponse;
use super::{
    ApiError, Assistant, AssistantSpec, FileObject, NewMessage, Result, Run, RunApi, SessionApi,
    Thread, ThreadMessage, ToolOutput,
};

/// Beta header value selecting the Assistants v1 shapes (`file_ids` on messages).
const ASSISTANTS_BETA: &str = "assistants=v1";

/// Page size for message listing.
const MESSAGE_PAGE_LIMIT: u32 = 100;

/// Connection settings for the remote endpoint.
#[derive(Clone)]
pub struct ApiCredentials {
    /// Base URL including the version segment (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the Assistants endpoints.
///
/// One instance is built at startup and shared by reference; it holds no
/// per-run state.
#[derive(Clone)]
pub struct AssistantsClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for AssistantsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantsClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl AssistantsClient {
    /// Create a new client.
    pub fn new(credentials: &ApiCredentials) -> Result<Self> {
        Self::with_client(credentials, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(credentials: &ApiCredentials, http: reqwest::Client) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let mut base = credentials.base_url.trim_end_matches('/').to_string();
        base.push('/');
        Ok(Self {
            base_url: Url::parse(&base)?,
            api_key: credentials.api_key.clone(),
            http,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.authorized(self.http.get(url)).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .authorized(self.http.post(self.url(path)?))
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(ApiError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait::async_trait]
impl RunApi for AssistantsClient {
    async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<ThreadMessage> {
        let body = serde_json::to_value(message)?;
        self.post(&format!("threads/{thread_id}/messages"), &body)
            .await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        self.post(
            &format!("threads/{thread_id}/runs"),
            &json!({ "assistant_id": assistant_id }),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get(self.url(&format!("threads/{thread_id}/runs/{run_id}"))?)
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        self.post(
            &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &json!({ "tool_outputs": outputs }),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut out = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = self.url(&format!("threads/{thread_id}/messages"))?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("order", "asc")
                    .append_pair("limit", &MESSAGE_PAGE_LIMIT.to_string());
                if let Some(cursor) = &after {
                    query.append_pair("after", cursor);
                }
            }

            let page: ListResponse<ThreadMessage> = self.get(url).await?;
            let next = page.last_id.clone().or_else(|| page.data.last().map(|m| m.id.clone()));
            out.extend(page.data);

            match next {
                Some(cursor) if page.has_more => after = Some(cursor),
                _ => break,
            }
        }

        Ok(out)
    }
}

#[async_trait::async_trait]
impl SessionApi for AssistantsClient {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant> {
        let body = serde_json::to_value(spec)?;
        self.post("assistants", &body).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.post("threads", &json!({})).await
    }

    async fn upload_file(&self, path: &Path) -> Result<FileObject> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime.as_ref())?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let response = self
            .authorized(self.http.post(self.url("files")?))
            .multipart(form)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn attach_file(&self, assistant_id: &str, file_id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                &format!("assistants/{assistant_id}/files"),
                &json!({ "file_id": file_id }),
            )
            .await?;
        Ok(())
    }
}
