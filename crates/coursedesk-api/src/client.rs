// Async HTTP client for the Coursedesk admin REST API.
//
// Auth: `Authorization: Bearer <token>` from the injected `Session`.
// Every verb refuses to send when the session holds no token.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::envelope::{Normalized, normalize};
use crate::query::ListQuery;
use crate::session::Session;
use crate::transport::TransportConfig;
use crate::Error;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Mutations ────────────────────────────────────────────────────────

/// Write verb of a [`Mutation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One field of a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                content_type: None,
                bytes,
            },
        }
    }
}

/// Request body of a [`Mutation`].
///
/// JSON bodies go out as `application/json`; form bodies as
/// `multipart/form-data` with the boundary chosen by the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    None,
    Json(Value),
    Form(Vec<FormPart>),
}

/// A write against the admin API.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub endpoint: String,
    pub method: Method,
    pub body: Body,
}

impl Mutation {
    pub fn new(endpoint: impl Into<String>, method: Method, body: Body) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body,
        }
    }

    /// `POST /admin/{family}`
    pub fn create(family: &str, body: Value) -> Self {
        Self::new(admin_path(family), Method::Post, Body::Json(body))
    }

    /// `PUT /admin/{family}/{id}`
    pub fn update(family: &str, id: u64, body: Value) -> Self {
        Self::new(admin_entity_path(family, id), Method::Put, Body::Json(body))
    }

    /// `DELETE /admin/{family}/{id}`
    pub fn delete(family: &str, id: u64) -> Self {
        Self::new(admin_entity_path(family, id), Method::Delete, Body::None)
    }

    /// `PUT /admin/users/{id}/role`
    pub fn user_role(id: u64, role: &str) -> Self {
        Self::new(
            format!("{}/role", admin_entity_path("users", id)),
            Method::Put,
            Body::Json(serde_json::json!({ "role": role })),
        )
    }

    /// `PUT /admin/users/{id}/status`
    pub fn user_status(id: u64, status: &str) -> Self {
        Self::new(
            format!("{}/status", admin_entity_path("users", id)),
            Method::Put,
            Body::Json(serde_json::json!({ "status": status })),
        )
    }
}

/// `/admin/{family}`
pub fn admin_path(family: &str) -> String {
    format!("/admin/{family}")
}

/// `/admin/{family}/{id}`
pub fn admin_entity_path(family: &str, id: u64) -> String {
    format!("/admin/{family}/{id}")
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the admin API.
///
/// Cheap to clone: the underlying `reqwest::Client` and `Session` are both
/// reference counted.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl AdminClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL string and a transport config.
    pub fn new(base_url: &str, transport: &TransportConfig, session: Session) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(Url::parse(base_url)?);
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Session) -> Self {
        Self {
            http,
            base_url: Self::normalize_base_url(base_url),
            session,
        }
    }

    /// Ensure the base path ends with `/` so endpoint joins append to it.
    fn normalize_base_url(mut url: Url) -> Url {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an endpoint (e.g. `"/admin/users"`) onto the base URL.
    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        let relative = endpoint.trim().trim_start_matches('/');
        if relative.is_empty() {
            return Err(Error::InvalidInput("endpoint must not be empty".into()));
        }
        Ok(self.base_url.join(relative)?)
    }

    fn bearer(&self) -> Result<SecretString, Error> {
        self.session.current_token().ok_or(Error::Unauthenticated)
    }

    // ── Verbs ────────────────────────────────────────────────────────

    /// `GET` an endpoint and normalize whatever envelope comes back.
    ///
    /// `query` adds `page`/`pageSize` plus server-side sort and filter
    /// parameters.
    pub async fn fetch(&self, endpoint: &str, query: Option<&ListQuery>) -> Result<Normalized, Error> {
        let url = self.url(endpoint)?;
        let token = self.bearer()?;
        let params = query.map(ListQuery::to_params).unwrap_or_default();
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .query(&params)
            .send()
            .await?;
        let body = Self::handle_response(resp).await?;
        Ok(normalize(body))
    }

    /// Send a write and return the parsed response body (`null` when empty).
    pub async fn mutate(&self, mutation: &Mutation) -> Result<Value, Error> {
        let url = self.url(&mutation.endpoint)?;
        let token = self.bearer()?;
        debug!("{} {url}", mutation.method.as_str());

        let mut request = self
            .http
            .request(mutation.method.to_reqwest(), url)
            .bearer_auth(token.expose_secret());

        request = match &mutation.body {
            Body::None => request,
            Body::Json(value) => request.json(value),
            Body::Form(parts) => request.multipart(build_form(parts)?),
        };

        let resp = request.send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

        debug!(status = status.as_u16(), %message, "request failed");
        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, Error> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match &part.value {
            FormValue::Text(text) => form.text(part.name.clone(), text.clone()),
            FormValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone());
                if let Some(ct) = content_type {
                    file = file.mime_str(ct)?;
                }
                form.part(part.name.clone(), file)
            }
        };
    }
    Ok(form)
}
