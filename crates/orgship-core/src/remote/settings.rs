//! Settings store backed by a custom setting record in the org.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::OrgClient;
use crate::error::{Error, Result};
use crate::settings::{OrgSettings, SettingsStore};

/// API name of the custom setting holding the marker.
pub const SETTINGS_OBJECT: &str = "OrgshipSettings__c";
const RECORD_NAME: &str = "orgship";

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsRecord {
    #[serde(rename = "Id", skip_serializing)]
    id: Option<String>,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "Revision__c")]
    revision: Option<String>,
    #[serde(rename = "JobName__c")]
    job_name: Option<String>,
    #[serde(rename = "BuildNumber__c")]
    build_number: Option<String>,
    #[serde(rename = "DeployedAt__c")]
    deployed_at: Option<String>,
}

/// Org timestamps come as `2024-03-01T10:00:00.000+0000`.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Reads and writes the marker through the data API.
#[derive(Debug, Clone)]
pub struct RemoteSettingsStore {
    client: Arc<OrgClient>,
}

impl RemoteSettingsStore {
    pub fn new(client: Arc<OrgClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self) -> Result<Option<SettingsRecord>> {
        let soql = format!(
            "SELECT Id, Name, Revision__c, JobName__c, BuildNumber__c, DeployedAt__c \
             FROM {} WHERE Name = '{}' LIMIT 1",
            SETTINGS_OBJECT, RECORD_NAME
        );
        let mut url = self.client.data_url("query")?;
        url.query_pairs_mut().append_pair("q", &soql);

        match self.client.get_json::<QueryResponse<SettingsRecord>>(url).await {
            Ok(response) => Ok(response.records.into_iter().next()),
            Err(Error::Service { code, message }) if code == "INVALID_TYPE" => {
                warn!(
                    "Custom setting {} is not installed in the org: {}",
                    SETTINGS_OBJECT, message
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl SettingsStore for RemoteSettingsStore {
    async fn get(&self) -> Result<Option<OrgSettings>> {
        Ok(self.fetch().await?.map(|record| OrgSettings {
            last_deployed_revision: record.revision.filter(|r| !r.is_empty()),
            job_name: record.job_name,
            build_number: record.build_number,
            deployed_at: record.deployed_at.as_deref().and_then(parse_timestamp),
        }))
    }

    async fn set(&self, revision: &str, job_name: &str, build_number: &str) -> Result<()> {
        let existing = self.fetch().await?.and_then(|r| r.id);
        let mut record = SettingsRecord {
            id: None,
            name: None,
            revision: Some(revision.to_string()),
            job_name: Some(job_name.to_string()),
            build_number: Some(build_number.to_string()),
            deployed_at: Some(Utc::now().to_rfc3339()),
        };

        match existing {
            Some(id) => {
                let url = self
                    .client
                    .data_url(&format!("sobjects/{}/{}", SETTINGS_OBJECT, id))?;
                self.client.send_json(Method::PATCH, url, &record).await?;
                debug!("Updated {} record {}", SETTINGS_OBJECT, id);
            }
            None => {
                record.name = Some(RECORD_NAME.to_string());
                let url = self.client.data_url(&format!("sobjects/{}", SETTINGS_OBJECT))?;
                self.client.send_json(Method::POST, url, &record).await?;
                debug!("Created {} record", SETTINGS_OBJECT);
            }
        }
        Ok(())
    }
}
