//! HTTP client for the org's REST API.
//!
//! Logs in with the OAuth username-password flow, then speaks the metadata
//! deploy endpoints and the data API used by the settings store.

mod settings;
mod wire;

pub use settings::{RemoteSettingsStore, SETTINGS_OBJECT};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::deploy::{DeployOptions, DeployService, DeployStatus};
use crate::error::{Error, Result};
use wire::{ApiError, DeployRequestBody, DeployRequestResponse, LoginError, TokenResponse};

const USER_AGENT: &str = concat!("orgship/", env!("CARGO_PKG_VERSION"));

/// Login credentials for a connected app.
#[derive(Clone)]
pub struct Credentials {
    pub login_url: Url,
    pub username: String,
    pub password: String,
    pub security_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub proxy: Option<Url>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_url", &self.login_url.as_str())
            .field("username", &self.username)
            .field("client_id", &self.client_id)
            .field("proxy", &self.proxy.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

/// Authenticated session against one org.
#[derive(Debug, Clone)]
pub struct OrgClient {
    http: reqwest::Client,
    instance_url: Url,
    access_token: String,
    api_version: String,
}

impl OrgClient {
    /// Log in and open a session.
    pub async fn login(credentials: &Credentials, api_version: &str) -> Result<Self> {
        let http = http_client(credentials.proxy.as_ref())?;
        let token_url = credentials
            .login_url
            .join("services/oauth2/token")
            .map_err(|e| Error::config(format!("Invalid login URL: {}", e)))?;

        let password = format!(
            "{}{}",
            credentials.password,
            credentials.security_token.as_deref().unwrap_or("")
        );
        let params = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", credentials.username.as_str()),
            ("password", password.as_str()),
        ];

        info!("Logging in to {} as {}", credentials.login_url, credentials.username);
        let response = http.post(token_url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<LoginError>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(Error::config(format!("Login failed: {}", reason)));
        }

        let token: TokenResponse = response.json().await?;
        let instance_url = Url::parse(&token.instance_url)
            .map_err(|e| Error::config(format!("Invalid instance URL: {}", e)))?;
        debug!("Session opened on {}", instance_url);

        Ok(Self {
            http,
            instance_url,
            access_token: token.access_token,
            api_version: api_version.to_string(),
        })
    }

    pub fn instance_url(&self) -> &Url {
        &self.instance_url
    }

    /// `<instance>/services/data/v<api>/<path>`
    pub fn data_url(&self, path: &str) -> Result<Url> {
        self.instance_url
            .join(&format!("services/data/v{}/{}", self.api_version, path))
            .map_err(|e| Error::config(format!("Invalid API path '{}': {}", path, e)))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        checked(response).await
    }
}

#[async_trait]
impl DeployService for OrgClient {
    async fn submit(&self, archive: &[u8], options: &DeployOptions) -> Result<String> {
        let url = self.data_url("metadata/deployRequest")?;
        let body = serde_json::to_string(&DeployRequestBody::from(options))?;
        let form = Form::new()
            .part("json", Part::text(body).mime_str("application/json")?)
            .part(
                "file",
                Part::bytes(archive.to_vec())
                    .file_name("deploy.zip")
                    .mime_str("application/zip")?,
            );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let parsed: DeployRequestResponse = checked(response).await?.json().await?;
        Ok(parsed.id)
    }

    async fn check_status(&self, async_id: &str, include_details: bool) -> Result<DeployStatus> {
        let mut url = self.data_url(&format!("metadata/deployRequest/{}", async_id))?;
        url.query_pairs_mut()
            .append_pair("includeDetails", if include_details { "true" } else { "false" });

        let parsed: DeployRequestResponse = self.get_json(url).await?;
        Ok(parsed
            .deploy_result
            .unwrap_or_default()
            .into_status(&parsed.id))
    }
}

fn http_client(proxy: Option<&Url>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }
    Ok(builder.build()?)
}

/// Map an unsuccessful response to a service error carrying the API error code.
async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let first = serde_json::from_str::<Vec<ApiError>>(&body)
        .ok()
        .and_then(|errors| errors.into_iter().next());
    Err(match first {
        Some(err) => Error::service(err.error_code, err.message),
        None => Error::service(format!("HTTP_{}", status.as_u16()), body),
    })
}
