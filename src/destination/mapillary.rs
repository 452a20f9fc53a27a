use std::{collections::BTreeMap, time::Duration};

use reqwest::{StatusCode, blocking::Client};

use crate::{
    destination::service::{DestinationService, SequenceStatus, Session},
    foundation::error::{GeoseqError, GeoseqResult},
    sequence::model::Photo,
};

/// Connection settings for [`MapillaryClient`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MapillaryConfig {
    pub api_base: String,
    pub client_id: String,
    pub timeout_secs: u64,
}

impl Default for MapillaryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://a.mapillary.com/v3".to_string(),
            client_id: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Blocking Mapillary upload-session client.
pub struct MapillaryClient {
    config: MapillaryConfig,
    client: Client,
}

#[derive(serde::Serialize)]
struct CreateSessionRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(serde::Deserialize)]
struct SessionResponse {
    key: String,
}

impl MapillaryClient {
    pub fn new(config: MapillaryConfig) -> GeoseqResult<Self> {
        if config.api_base.trim().is_empty() {
            return Err(GeoseqError::validation("mapillary api_base must be set"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| GeoseqError::external(format!("build http client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?client_id={}",
            self.config.api_base.trim_end_matches('/'),
            path.trim_start_matches('/'),
            self.config.client_id
        )
    }
}

impl DestinationService for MapillaryClient {
    fn resolve_session(&self, credential: &str) -> GeoseqResult<Session> {
        if credential.is_empty() {
            return Err(GeoseqError::external("no mapillary token stored"));
        }
        let resp = self
            .client
            .post(self.url("me/uploads"))
            .bearer_auth(credential)
            .json(&CreateSessionRequest {
                kind: "images/sequence",
            })
            .send()
            .map_err(|e| GeoseqError::external(format!("mapillary session request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeoseqError::external(format!(
                "mapillary session request failed with HTTP {status}"
            )));
        }
        let body: SessionResponse = resp
            .json()
            .map_err(|e| GeoseqError::external(format!("mapillary session response: {e}")))?;
        tracing::debug!(key = %body.key, "opened mapillary upload session");
        Ok(Session { key: body.key })
    }

    fn check_sequence_status(
        &self,
        credential: &str,
        external_sequence_id: &str,
        _photos: &BTreeMap<String, Photo>,
    ) -> GeoseqResult<SequenceStatus> {
        let resp = self
            .client
            .get(self.url(&format!("me/uploads/{external_sequence_id}")))
            .bearer_auth(credential)
            .send()
            .map_err(|e| GeoseqError::external(format!("mapillary status request: {e}")))?;

        // A closed session disappears once Mapillary has sequenced its images.
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(SequenceStatus { linked: true }),
            s if s.is_success() => Ok(SequenceStatus { linked: false }),
            s => Err(GeoseqError::external(format!(
                "mapillary status request failed with HTTP {s}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/destination/mapillary.rs"]
mod tests;
