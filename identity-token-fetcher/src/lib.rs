use anyhow::{bail, Result};
use reqwest::Client;
use serde::Deserialize;

const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const APP_SERVICE_HEADER_KEY: &str = "X-IDENTITY-HEADER";
const IMDS_API_VERSION: &str = "2018-02-01";
const IMDS_HEADER_KEY: &str = "Metadata";
const IMDS_HEADER_VALUE: &str = "true";

pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityTokenResponse {
    access_token: String,
}

/// Where the platform exposes the managed identity of the running process.
#[derive(Clone)] // No Debug, the App Service header is a secret
pub enum IdentityEndpoint {
    /// App Service and Functions: `IDENTITY_ENDPOINT` guarded by `IDENTITY_HEADER`.
    AppService { endpoint: String, header: String },
    /// Instance metadata service on virtual machines and container hosts.
    Imds { endpoint: String },
}

impl Default for IdentityEndpoint {
    fn default() -> Self {
        IdentityEndpoint::Imds {
            endpoint: DEFAULT_IMDS_ENDPOINT.to_owned(),
        }
    }
}

#[derive(Clone, Default)]
pub struct IdentityTokenFetcher {
    client: Client,
    endpoint: IdentityEndpoint,
    client_id: Option<String>,
}

impl IdentityTokenFetcher {
    pub fn new(endpoint: IdentityEndpoint) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: IdentityEndpoint) -> Self {
        Self {
            client,
            endpoint,
            client_id: None,
        }
    }

    /// Selects a user-assigned identity instead of the system-assigned one.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Returns an `Authorization` header value for `resource`.
    pub async fn get_token(&self, resource: &str) -> Result<String> {
        let req = match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, header } => self
                .client
                .get(endpoint)
                .query(&[
                    ("api-version", APP_SERVICE_API_VERSION),
                    ("resource", resource),
                ])
                .header(APP_SERVICE_HEADER_KEY, header),
            IdentityEndpoint::Imds { endpoint } => self
                .client
                .get(endpoint)
                .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)])
                .header(IMDS_HEADER_KEY, IMDS_HEADER_VALUE),
        };

        let req = match &self.client_id {
            Some(client_id) => req.query(&[("client_id", client_id.as_str())]),
            None => req,
        };

        let res = req.send().await?;

        let status = res.status();
        if !status.is_success() {
            bail!("Identity endpoint responded with status {status}");
        }

        let res = res.json::<IdentityTokenResponse>().await?;

        Ok(format!("Bearer {}", res.access_token))
    }
}
