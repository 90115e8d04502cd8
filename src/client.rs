use crate::config::Session;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::{Client, RequestBuilder, multipart::Form};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const USER_AGENT: &str = concat!("podmanager-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl ResponseData {
    /// Normalises a response body into a record collection.
    pub fn into_records(self) -> Vec<Value> {
        match self.json {
            Some(Value::Array(items)) => items,
            Some(Value::Object(mut map)) => {
                if let Some(Value::Array(items)) = map.get_mut("data") {
                    return std::mem::take(items);
                }
                vec![Value::Object(map)]
            }
            Some(Value::Null) | None => Vec::new(),
            Some(scalar) => vec![scalar],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    token: String,
}

impl ApiClient {
    pub fn new(session: &Session) -> Result<Self> {
        Ok(Self {
            base_url: parse_base(&session.target_server)?,
            http: build_http()?,
            token: session.access_token.clone(),
        })
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ResponseData> {
        self.request(Method::GET, path, query, Ok)
    }

    pub fn delete(&self, path: &str) -> Result<ResponseData> {
        self.request(Method::DELETE, path, &[], Ok)
    }

    /// Posts `file` as a multipart form field.
    pub fn upload(
        &self,
        path: &str,
        query: &[(&str, String)],
        field: &str,
        file: &Path,
    ) -> Result<ResponseData> {
        let form = Form::new()
            .file(field.to_string(), file)
            .with_context(|| format!("opening {}", file.display()))?;
        self.request(Method::POST, path, query, move |r| Ok(r.multipart(form)))
    }

    fn request<F>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        attach: F,
    ) -> Result<ResponseData>
    where
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder>,
    {
        let url = join(&self.base_url, path)?;
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = attach(request)?.send().context("sending request")?;
        read_response(&method, path, response)
    }
}

/// Exchanges account credentials for an access token.
pub fn login(server: &str, account: &str, password: &str) -> Result<String> {
    let url = join(&parse_base(server)?, "/api/v1/auth/login")?;
    let response = build_http()?
        .post(url)
        .query(&[("account", account), ("password", password)])
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .send()
        .context("sending login request")?;

    let data = read_response(&Method::POST, "/api/v1/auth/login", response)?;
    data.json
        .as_ref()
        .and_then(|json| json.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No access token received."))
}

fn build_http() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

fn parse_base(server: &str) -> Result<Url> {
    // A trailing slash keeps any base path when joining endpoints onto it.
    let normalized = format!("{}/", server.trim_end_matches('/'));
    Url::parse(&normalized).with_context(|| format!("parsing server URL `{server}`"))
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .with_context(|| format!("joining path `{}` to server URL", path))
}

fn read_response(
    method: &Method,
    path: &str,
    response: reqwest::blocking::Response,
) -> Result<ResponseData> {
    let status = response.status();
    let text = response.text().context("reading response body")?;
    if !status.is_success() {
        bail!("{method} {path} failed with {status}: {}", text.trim());
    }

    let json = serde_json::from_str(&text).ok();
    Ok(ResponseData {
        status: status.as_u16(),
        body: text,
        json,
    })
}
