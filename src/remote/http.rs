//! HTTP clients for the runtime config and functions services
//!
//! Both clients share [`ApiClient`], which owns the `reqwest` client, the
//! API base URL, and the bearer token handed over by the authentication
//! step. Responses are checked centrally: 404 becomes
//! [`FnshipError::NotFound`], any other failure status becomes
//! [`FnshipError::Remote`] carrying the message from the error body.

use super::{CloudFunction, FunctionsApi, RuntimeConfigApi, Variable};
use crate::config::HttpConfig;
use crate::deploy::names::FunctionName;
use crate::error::{FnshipError, Result};
use crate::runtime_config::ids::{config_name, variable_name};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const RUNTIME_CONFIG_VERSION: &str = "v1beta1";
const FUNCTIONS_VERSION: &str = "v1";

/// Shared request plumbing for Google-style REST APIs
#[derive(Debug, Clone)]
struct ApiClient {
    client: Client,
    base: String,
    version: &'static str,
    access_token: Option<String>,
}

/// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl ApiClient {
    fn new(api_base: &str, version: &'static str, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_seconds))
            .user_agent(concat!("fnship/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FnshipError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: api_base.trim_end_matches('/').to_string(),
            version,
            access_token: http.access_token.clone(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}/{}", self.base, self.version, resource)
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        let url = self.url(resource);
        tracing::debug!(http.method = %method, http.url = %url, "Remote request");
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(resource: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .ok()
            .filter(|message| !message.is_empty())
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            return Err(FnshipError::NotFound(resource.to_string()).into());
        }
        Err(FnshipError::Remote {
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn send(&self, resource: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        Self::check(resource, response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, resource: &str, builder: RequestBuilder) -> Result<T> {
        let response = self.send(resource, builder).await?;
        Ok(response.json::<T>().await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListConfigsResponse {
    #[serde(default)]
    configs: Vec<ConfigResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigResource {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVariablesResponse {
    #[serde(default)]
    variables: Vec<Variable>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Runtime config service client
///
/// # Examples
///
/// ```
/// use fnship::config::HttpConfig;
/// use fnship::remote::HttpRuntimeConfig;
///
/// let client = HttpRuntimeConfig::new("https://runtimeconfig.googleapis.com", &HttpConfig::default());
/// assert!(client.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HttpRuntimeConfig {
    api: ApiClient,
}

impl HttpRuntimeConfig {
    /// Create a client for the given API base
    pub fn new(api_base: &str, http: &HttpConfig) -> Result<Self> {
        tracing::debug!("Initialized runtime config client: base={}", api_base);
        Ok(Self {
            api: ApiClient::new(api_base, RUNTIME_CONFIG_VERSION, http)?,
        })
    }

    async fn create_config(&self, project: &str, config: &str) -> Result<()> {
        let parent = format!("projects/{}/configs", project);
        let body = serde_json::json!({ "name": config_name(project, config) });
        let builder = self.api.request(Method::POST, &parent).json(&body);
        match self.api.send(&parent, builder).await {
            Ok(_) => Ok(()),
            Err(err) if FnshipError::remote_status(&err) == Some(409) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn create_variable(&self, project: &str, config: &str, body: &Variable) -> Result<()> {
        let parent = format!("{}/variables", config_name(project, config));
        let builder = self.api.request(Method::POST, &parent).json(body);
        self.api.send(&parent, builder).await.map(|_| ())
    }
}

#[async_trait]
impl RuntimeConfigApi for HttpRuntimeConfig {
    async fn list_configs(&self, project: &str) -> Result<Vec<String>> {
        let resource = format!("projects/{}/configs", project);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self.api.request(Method::GET, &resource);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }
            let page: ListConfigsResponse = self.api.send_json(&resource, builder).await?;
            names.extend(page.configs.into_iter().map(|c| c.name));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(names)
    }

    async fn list_variables(&self, config: &str) -> Result<Vec<Variable>> {
        let resource = format!("{}/variables", config);
        let mut variables = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self
                .api
                .request(Method::GET, &resource)
                .query(&[("returnValues", "true")]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }
            let page: ListVariablesResponse = self.api.send_json(&resource, builder).await?;
            variables.extend(page.variables);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(variables)
    }

    async fn get_variable(&self, variable: &str) -> Result<Variable> {
        let builder = self.api.request(Method::GET, variable);
        self.api.send_json(variable, builder).await
    }

    async fn set_variable(&self, project: &str, config: &str, path: &str, text: &str) -> Result<()> {
        let name = variable_name(project, config, path);
        let body = Variable {
            name: name.clone(),
            text: text.to_string(),
        };

        let builder = self.api.request(Method::PUT, &name).json(&body);
        match self.api.send(&name, builder).await {
            Ok(_) => return Ok(()),
            Err(err) if FnshipError::is_not_found(&err) => {}
            Err(err) => return Err(err),
        }

        match self.create_variable(project, config, &body).await {
            Ok(()) => Ok(()),
            Err(err) if FnshipError::is_not_found(&err) => {
                tracing::debug!("Creating config {} for {}", config, name);
                self.create_config(project, config).await?;
                self.create_variable(project, config, &body).await
            }
            Err(err) => Err(err),
        }
    }

    async fn delete_variable(&self, variable: &str) -> Result<()> {
        let builder = self
            .api
            .request(Method::DELETE, variable)
            .query(&[("recursive", "true")]);
        self.api.send(variable, builder).await.map(|_| ())
    }

    async fn delete_config(&self, project: &str, config: &str) -> Result<()> {
        let name = config_name(project, config);
        let builder = self.api.request(Method::DELETE, &name);
        self.api.send(&name, builder).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFunctionsResponse {
    #[serde(default)]
    functions: Vec<CloudFunction>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    unreachable: Vec<String>,
}

/// Functions service client
#[derive(Debug, Clone)]
pub struct HttpFunctions {
    api: ApiClient,
}

impl HttpFunctions {
    /// Create a client for the given API base
    pub fn new(api_base: &str, http: &HttpConfig) -> Result<Self> {
        tracing::debug!("Initialized functions client: base={}", api_base);
        Ok(Self {
            api: ApiClient::new(api_base, FUNCTIONS_VERSION, http)?,
        })
    }
}

#[async_trait]
impl FunctionsApi for HttpFunctions {
    async fn list_functions(&self, project: &str) -> Result<Vec<CloudFunction>> {
        let resource = format!("projects/{}/locations/-/functions", project);
        let mut functions = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self.api.request(Method::GET, &resource);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }
            let page: ListFunctionsResponse = self.api.send_json(&resource, builder).await?;
            if !page.unreachable.is_empty() {
                tracing::warn!(
                    "Could not list functions in regions: {}",
                    page.unreachable.join(", ")
                );
            }
            functions.extend(page.functions);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(functions)
    }

    async fn create_function(&self, function: &CloudFunction) -> Result<()> {
        let resource = format!("{}/functions", function.name.parent());
        let builder = self.api.request(Method::POST, &resource).json(function);
        self.api.send(&resource, builder).await.map(|_| ())
    }

    async fn update_function(&self, function: &CloudFunction) -> Result<()> {
        let resource = function.name.to_string();
        let builder = self.api.request(Method::PATCH, &resource).json(function);
        self.api.send(&resource, builder).await.map(|_| ())
    }

    async fn delete_function(&self, name: &FunctionName) -> Result<()> {
        let resource = name.to_string();
        let builder = self.api.request(Method::DELETE, &resource);
        self.api.send(&resource, builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_version_and_resource() {
        let api = ApiClient::new(
            "https://runtimeconfig.example.invalid/",
            RUNTIME_CONFIG_VERSION,
            &HttpConfig::default(),
        )
        .unwrap();
        assert_eq!(
            api.url("projects/p/configs"),
            "https://runtimeconfig.example.invalid/v1beta1/projects/p/configs"
        );
    }

    #[test]
    fn test_error_envelope_parses_message() {
        let body = r#"{"error":{"code":403,"message":"permission denied","status":"PERMISSION_DENIED"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "permission denied");
    }
}
