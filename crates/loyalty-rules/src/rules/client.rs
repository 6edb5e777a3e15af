use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::directory::{DirectoryError, RuleDirectory, RuleStore, StoreError};
use super::domain::{AttributeOption, OutcomeOption};
use super::labels::display_or_formatted;
use super::listing::{RuleFilter, RuleSummary};
use super::mapping::{deserialize_optional_id, RuleRecord};
use super::payload::RulePayload;
use crate::session::SessionContext;

/// Failure to construct the underlying HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("failed to build rule engine http client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// REST adapter for the rule engine's attribute, outcome and rule endpoints.
///
/// Every request carries the session's access token and is scoped to the session's
/// loyalty type.
#[derive(Debug, Clone)]
pub struct HttpRuleEngineClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpRuleEngineClient {
    pub fn new(
        base_url: &str,
        session: SessionContext,
        timeout: Duration,
    ) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = format!("{}/", base_url.trim().trim_end_matches('/'));
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.session.access_token)
            .query(&[
                ("access_token", self.session.access_token.as_str()),
                ("q[loyalty_type_id_eq]", self.session.loyalty_type_id.as_str()),
            ])
    }

    fn directory_query(&self) -> [(&'static str, String); 2] {
        [
            ("company_id", self.session.company_id.to_string()),
            ("active", "true".to_string()),
        ]
    }

    async fn master_attribute_entries(&self) -> Result<Vec<MasterAttributeEntry>, DirectoryError> {
        let request = self
            .authorized(self.http.get(self.url("rule_engine/master_attributes.json")))
            .query(&self.directory_query());
        let envelope: MasterAttributeEnvelope = directory_json(request).await?;
        Ok(envelope.master_attributes)
    }

    async fn master_outcome_entries(&self) -> Result<Vec<MasterOutcomeEntry>, DirectoryError> {
        let request = self
            .authorized(self.http.get(self.url("rule_engine/master_reward_outcomes.json")))
            .query(&self.directory_query());
        let envelope: MasterOutcomeEnvelope = directory_json(request).await?;
        Ok(envelope.master_reward_outcome)
    }

    async fn fetch_summaries(&self, pairs: &[(&'static str, String)]) -> Result<Vec<RuleSummary>, StoreError> {
        let request = self
            .authorized(self.http.get(self.url("rule_engine/rules.json")))
            .query(pairs);
        let response = send(request).await?;
        let response = reject_unsuccessful(response).await?;
        response
            .json::<Vec<RuleSummary>>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn persist(&self, request: RequestBuilder, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        let response = send(request.json(payload)).await?;
        let response = reject_unsuccessful(response).await?;
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        match serde_json::from_str::<RuleRecord>(&body) {
            Ok(record) if record.id.is_some() => Ok(record),
            _ => {
                debug!("rule engine response carried no rule; echoing submitted payload");
                Ok(RuleRecord::echo(payload))
            }
        }
    }
}

#[async_trait]
impl RuleDirectory for HttpRuleEngineClient {
    async fn master_attributes(&self) -> Result<Vec<AttributeOption>, DirectoryError> {
        let entries = self.master_attribute_entries().await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let id = entry.id?;
                Some(AttributeOption {
                    id,
                    display_name: display_or_formatted(&entry.display_name, &entry.attribute_name),
                    attribute_name: entry.attribute_name,
                })
            })
            .collect())
    }

    async fn sub_attributes(&self, master_attribute_id: u64) -> Result<Vec<AttributeOption>, DirectoryError> {
        let entry = self
            .master_attribute_entries()
            .await?
            .into_iter()
            .find(|entry| entry.id == Some(master_attribute_id))
            .ok_or(DirectoryError::UnknownMaster(master_attribute_id))?;

        Ok(entry
            .sub_attributes
            .into_iter()
            .filter_map(|sub| {
                let id = sub.id?;
                Some(AttributeOption {
                    id,
                    display_name: display_or_formatted(&sub.display_name, &sub.attribute_name),
                    attribute_name: sub.attribute_name,
                })
            })
            .collect())
    }

    async fn master_outcomes(&self) -> Result<Vec<OutcomeOption>, DirectoryError> {
        let entries = self.master_outcome_entries().await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                Some(OutcomeOption {
                    id: entry.id?,
                    display_name: display_or_formatted(&entry.display_name, &entry.lock_model_name),
                    lock_model_name: entry.lock_model_name,
                })
            })
            .collect())
    }

    async fn sub_outcomes(&self, master_outcome_id: u64) -> Result<Vec<OutcomeOption>, DirectoryError> {
        let entry = self
            .master_outcome_entries()
            .await?
            .into_iter()
            .find(|entry| entry.id == Some(master_outcome_id))
            .ok_or(DirectoryError::UnknownMaster(master_outcome_id))?;

        let lock_model_name = entry.lock_model_name;
        Ok(entry
            .sub_reward_outcome
            .into_iter()
            .filter_map(|sub| {
                Some(OutcomeOption {
                    id: sub.id?,
                    display_name: display_or_formatted(&sub.display_name, &sub.lock_model_name),
                    lock_model_name: if sub.lock_model_name.is_empty() {
                        lock_model_name.clone()
                    } else {
                        sub.lock_model_name
                    },
                })
            })
            .collect())
    }
}

#[async_trait]
impl RuleStore for HttpRuleEngineClient {
    async fn fetch_rule(&self, rule_id: u64) -> Result<RuleRecord, StoreError> {
        let request =
            self.authorized(self.http.get(self.url(&format!("rule_engine/rules/{rule_id}.json"))));
        let response = send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(rule_id));
        }
        let response = reject_unsuccessful(response).await?;
        response
            .json::<RuleRecord>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    async fn create_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        let request = self.authorized(self.http.post(self.url("rule_engine/rules/loyalty_re")));
        let record = self.persist(request, payload).await?;
        info!(rule_id = ?record.id, "rule created");
        Ok(record)
    }

    async fn update_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        let request = self.authorized(
            self.http
                .put(self.url("rule_engine/rules/loyalty_re_update.json")),
        );
        let record = self.persist(request, payload).await?;
        info!(rule_id = ?payload.rule_id(), "rule updated");
        Ok(record)
    }

    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleSummary>, StoreError> {
        let pairs = filter.query_pairs();
        if pairs.is_empty() {
            let rules = self.fetch_summaries(&[]).await?;
            return Ok(rules.into_iter().filter(|rule| filter.matches(rule)).collect());
        }

        match self.fetch_summaries(&pairs).await {
            Ok(rules) => Ok(rules.into_iter().filter(|rule| filter.matches(rule)).collect()),
            Err(err) => {
                warn!(error = %err, "filtered rule listing failed, filtering locally");
                let rules = self.fetch_summaries(&[]).await?;
                Ok(rules.into_iter().filter(|rule| filter.matches(rule)).collect())
            }
        }
    }

    async fn set_active(&self, rule_id: u64, active: bool) -> Result<(), StoreError> {
        let request = self
            .authorized(self.http.patch(self.url(&format!("rule_engine/rules/{rule_id}.json"))))
            .json(&json!({ "rule_engine_rule": { "active": active } }));
        let response = send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(rule_id));
        }
        reject_unsuccessful(response).await?;
        Ok(())
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    request
        .send()
        .await
        .map_err(|err| StoreError::Transport(err.to_string()))
}

async fn reject_unsuccessful(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "rule engine rejected request");
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn directory_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, DirectoryError> {
    let response = request
        .send()
        .await
        .map_err(|err| DirectoryError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(DirectoryError::Status {
            status: status.as_u16(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| DirectoryError::Decode(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct MasterAttributeEnvelope {
    #[serde(default)]
    master_attributes: Vec<MasterAttributeEntry>,
}

#[derive(Debug, Deserialize)]
struct MasterAttributeEntry {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<u64>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    attribute_name: String,
    #[serde(default)]
    sub_attributes: Vec<SubAttributeEntry>,
}

#[derive(Debug, Deserialize)]
struct SubAttributeEntry {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<u64>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    attribute_name: String,
}

#[derive(Debug, Deserialize)]
struct MasterOutcomeEnvelope {
    #[serde(default)]
    master_reward_outcome: Vec<MasterOutcomeEntry>,
}

#[derive(Debug, Deserialize)]
struct MasterOutcomeEntry {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<u64>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    lock_model_name: String,
    #[serde(default)]
    sub_reward_outcome: Vec<SubOutcomeEntry>,
}

#[derive(Debug, Deserialize)]
struct SubOutcomeEntry {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<u64>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    lock_model_name: String,
}
