use itertools::Itertools;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};

use crate::config::{AppConfig, Credentials, INTEGRATION_NAME, INTEGRATION_VENDOR, INTEGRATION_VERSION};
use crate::model::{Reference, WhereClause};
use crate::store::traits::{ServiceError, WorkItemService};

/// Work-item service backed by the Rally Web Services API
#[derive(Debug)]
pub struct RallyService {
    client: Client,
    api_base: String,
    credentials: Credentials,
    page_size: u32,
    /// Obtained on the first update when authenticating with a password
    security_token: Mutex<Option<String>>,
}

impl RallyService {
    pub fn new(
        api_base: impl Into<String>,
        credentials: Credentials,
        page_size: u32,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        for (name, value) in integration_headers() {
            let value = HeaderValue::from_str(value)
                .map_err(|e| ServiceError::Transport(format!("invalid header {name}: {e}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            page_size: page_size.max(1),
            security_token: Mutex::new(None),
        })
    }

    /// Build a client from loaded configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let credentials = config.credentials()?;
        Ok(Self::new(config.api_base(), credentials, config.page_size())?)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Absolute URL for a reference; the service hands out absolute references
    /// but relative paths are resolved against the API base
    fn url_for(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/{}", self.api_base, reference.trim_start_matches('/'))
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiKey(key) => request.header("ZSESSIONID", key),
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ServiceError> {
        let response = self.authorize(request).send().await?;
        read_json(response).await
    }

    async fn security_token(&self) -> Result<Option<String>, ServiceError> {
        if matches!(self.credentials, Credentials::ApiKey(_)) {
            return Ok(None);
        }
        let cached = self.security_token.lock().clone();
        if cached.is_some() {
            return Ok(cached);
        }

        let body = self
            .send(self.client.get(self.url_for("security/authorize")))
            .await?;
        let result = section(&body, "OperationResult")?;
        check_errors(result)?;
        let token = result
            .get("SecurityToken")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Malformed("no SecurityToken in authorize response".to_string()))?
            .to_string();

        log::debug!("obtained security token");
        *self.security_token.lock() = Some(token.clone());
        Ok(Some(token))
    }

    async fn page(
        &self,
        url: &str,
        params: &[(&str, String)],
        start: u64,
    ) -> Result<(Vec<Value>, u64), ServiceError> {
        let request = self
            .client
            .get(url)
            .query(params)
            .query(&[("start", start.to_string()), ("pagesize", self.page_size.to_string())]);
        let body = self.send(request).await?;
        let result = section(&body, "QueryResult")?;
        check_errors(result)?;

        let results = result
            .get("Results")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ServiceError::Malformed("QueryResult has no Results".to_string()))?;
        let total = result
            .get("TotalResultCount")
            .and_then(Value::as_u64)
            .unwrap_or(results.len() as u64);

        Ok((results, total))
    }
}

#[async_trait::async_trait]
impl WorkItemService for RallyService {
    async fn query(
        &self,
        item_type: &str,
        clause: &WhereClause,
        fetch: &[&str],
    ) -> Result<Vec<Value>, ServiceError> {
        let url = self.url_for(&item_type.to_lowercase());
        let mut params = vec![("query", clause.to_string())];
        params.extend(fetch_param(fetch));

        let (results, _total) = self.page(&url, &params, 1).await?;
        Ok(results)
    }

    async fn get(&self, reference: &Reference, fetch: &[&str]) -> Result<Map<String, Value>, ServiceError> {
        let request = self
            .client
            .get(self.url_for(reference.as_str()))
            .query(&fetch_param(fetch));
        let body = self.send(request).await?;
        single_object(body)
    }

    async fn get_collection(&self, reference: &Reference, fetch: &[&str]) -> Result<Vec<Value>, ServiceError> {
        let url = self.url_for(reference.as_str());
        let params = fetch_param(fetch);

        let mut members = Vec::new();
        let mut start = 1u64;
        loop {
            let (page, total) = self.page(&url, &params, start).await?;
            let received = page.len() as u64;
            members.extend(page);
            if received == 0 || members.len() as u64 >= total {
                break;
            }
            start += received;
        }

        log::debug!("fetched {} members of {}", members.len(), reference);
        Ok(members)
    }

    async fn update(
        &self,
        reference: &Reference,
        fields: Map<String, Value>,
    ) -> Result<Map<String, Value>, ServiceError> {
        let item_type = reference
            .item_type()
            .ok_or_else(|| ServiceError::Malformed(format!("cannot tell item type of {reference}")))?
            .to_string();

        let mut request = self.client.post(self.url_for(reference.as_str()));
        if let Some(token) = self.security_token().await? {
            request = request.query(&[("key", token)]);
        }

        let mut body = Map::new();
        body.insert(item_type, Value::Object(fields));
        let body = self.send(request.json(&body)).await?;

        let result = section(&body, "OperationResult")?;
        check_errors(result)?;
        Ok(result
            .get("Object")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }
}

/// Identification headers attached to every request
pub fn integration_headers() -> [(&'static str, &'static str); 3] {
    [
        ("x-rallyintegrationname", INTEGRATION_NAME),
        ("x-rallyintegrationvendor", INTEGRATION_VENDOR),
        ("x-rallyintegrationversion", INTEGRATION_VERSION),
    ]
}

fn fetch_param(fetch: &[&str]) -> Vec<(&'static str, String)> {
    if fetch.is_empty() {
        Vec::new()
    } else {
        vec![("fetch", fetch.iter().join(","))]
    }
}

async fn read_json(response: Response) -> Result<Value, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Http {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ServiceError::Malformed(e.to_string()))
}

fn section<'a>(body: &'a Value, name: &str) -> Result<&'a Map<String, Value>, ServiceError> {
    body.get(name)
        .and_then(Value::as_object)
        .ok_or_else(|| ServiceError::Malformed(format!("response has no {name}")))
}

fn check_errors(result: &Map<String, Value>) -> Result<(), ServiceError> {
    let errors: Vec<String> = result
        .get("Errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .collect()
        })
        .unwrap_or_default();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Rejected(errors))
    }
}

/// A get by reference answers `{"<Type>": {...}}`, or an `OperationResult` carrying errors
fn single_object(body: Value) -> Result<Map<String, Value>, ServiceError> {
    if let Some(result) = body.get("OperationResult").and_then(Value::as_object) {
        check_errors(result)?;
    }

    let Value::Object(top) = body else {
        return Err(ServiceError::Malformed("response is not an object".to_string()));
    };

    top.into_iter()
        .filter(|(key, _)| key != "OperationResult")
        .find_map(|(_, value)| match value {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .ok_or_else(|| ServiceError::Malformed("response carries no object".to_string()))
}
