//! TeamCity REST API client.
//!
//! Fetches recent builds of a build configuration from
//! `/app/rest/builds` and converts TeamCity's JSON into [`Build`] records.

use super::BuildDataProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{
    Agent, Build, BuildConfigurationSummary, BuildReference, Change, Property,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, info};

/// Fields requested for every build.
const BUILD_FIELDS: &str = "build(id,buildTypeId,number,status,state,branchName,defaultBranch,\
href,webUrl,statusText,queuedDate,startDate,finishDate,percentageComplete,running-info,\
agent,buildType(id,name,projectName),properties(property),lastChanges(change),\
artifact-dependencies(build),snapshot-dependencies(build))";

/// TeamCity timestamp format, e.g. `20240301T104000+0100`.
const TEAMCITY_DATE_FORMAT: &str = "%Y%m%dT%H%M%S%z";

/// Connection settings for a TeamCity server.
#[derive(Debug, Clone)]
pub struct TeamCityConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: u64,
}

/// TeamCity builds list response.
#[derive(Debug, Deserialize)]
struct BuildsResponse {
    #[serde(default)]
    build: Vec<TeamCityBuild>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamCityBuild {
    id: i64,
    build_type_id: String,
    #[serde(default)]
    number: String,
    #[serde(default)]
    status: Option<String>,
    state: String,
    #[serde(default)]
    branch_name: Option<String>,
    #[serde(default)]
    default_branch: bool,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    status_text: Option<String>,
    #[serde(default, deserialize_with = "teamcity_date")]
    queued_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "teamcity_date")]
    start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "teamcity_date")]
    finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    percentage_complete: Option<u8>,
    #[serde(default, rename = "running-info")]
    running_info: Option<RunningInfo>,
    #[serde(default)]
    agent: Option<TeamCityAgent>,
    #[serde(default)]
    build_type: Option<TeamCityBuildType>,
    #[serde(default)]
    properties: Option<PropertyList>,
    #[serde(default)]
    last_changes: Option<ChangeList>,
    #[serde(default, rename = "artifact-dependencies")]
    artifact_dependencies: Option<BuildList>,
    #[serde(default, rename = "snapshot-dependencies")]
    snapshot_dependencies: Option<BuildList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunningInfo {
    #[serde(default)]
    percentage_complete: Option<u8>,
    #[serde(default)]
    elapsed_seconds: Option<u64>,
    #[serde(default)]
    estimated_total_seconds: Option<u64>,
    #[serde(default)]
    current_stage_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamCityAgent {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamCityBuildType {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    project_name: String,
}

#[derive(Debug, Deserialize)]
struct PropertyList {
    #[serde(default)]
    property: Vec<TeamCityProperty>,
}

#[derive(Debug, Deserialize)]
struct TeamCityProperty {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ChangeList {
    #[serde(default)]
    change: Vec<TeamCityChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamCityChange {
    id: i64,
    #[serde(default)]
    version: String,
    #[serde(default)]
    username: String,
    #[serde(default, deserialize_with = "teamcity_date")]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuildList {
    #[serde(default)]
    build: Vec<TeamCityBuildRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamCityBuildRef {
    id: i64,
    #[serde(default)]
    build_type_id: String,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

fn teamcity_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) => DateTime::parse_from_str(&s, TEAMCITY_DATE_FORMAT)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl From<TeamCityBuildRef> for BuildReference {
    fn from(r: TeamCityBuildRef) -> Self {
        BuildReference {
            id: r.id,
            build_configuration_id: r.build_type_id,
            number: r.number,
            href: r.href,
        }
    }
}

impl From<TeamCityBuild> for Build {
    fn from(b: TeamCityBuild) -> Self {
        let running = b.running_info.unwrap_or_default();

        Build {
            id: b.id,
            build_configuration_id: b.build_type_id,
            number: b.number,
            branch_name: b.branch_name.unwrap_or_default(),
            is_default_branch: b.default_branch,
            state: b.state,
            status: b.status,
            status_text: b.status_text,
            queued_date: b.queued_date,
            start_date: b.start_date,
            finish_date: b.finish_date,
            percentage_complete: b.percentage_complete.or(running.percentage_complete),
            elapsed_seconds: running.elapsed_seconds,
            estimated_total_seconds: running.estimated_total_seconds,
            current_stage_text: running.current_stage_text,
            agent: b.agent.map(|a| Agent {
                id: a.id,
                name: a.name,
                href: a.href,
            }),
            artifact_dependencies: b
                .artifact_dependencies
                .map(|l| l.build.into_iter().map(BuildReference::from).collect())
                .unwrap_or_default(),
            snapshot_dependencies: b
                .snapshot_dependencies
                .map(|l| l.build.into_iter().map(BuildReference::from).collect())
                .unwrap_or_default(),
            properties: b
                .properties
                .map(|l| {
                    l.property
                        .into_iter()
                        .map(|p| Property {
                            name: p.name,
                            value: p.value,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            last_changes: b
                .last_changes
                .map(|l| {
                    l.change
                        .into_iter()
                        .map(|c| Change {
                            id: c.id,
                            version: c.version,
                            username: c.username,
                            date: c.date,
                            web_url: c.web_url,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            build_configuration: b.build_type.map(|t| BuildConfigurationSummary {
                id: t.id,
                name: t.name,
                project_name: t.project_name,
            }),
            href: b.href,
            web_url: b.web_url,
        }
    }
}

/// Parse a `/app/rest/builds` JSON body into build records.
pub fn parse_builds_response(body: &str) -> ProviderResult<Vec<Build>> {
    let response: BuildsResponse = serde_json::from_str(body)?;
    Ok(response.build.into_iter().map(Build::from).collect())
}

/// Locator selecting recent builds of one configuration on every branch.
pub fn build_locator(build_configuration_id: &str, count: usize) -> String {
    format!(
        "buildType:(id:{}),branch:(default:any),running:any,canceled:false,count:{}",
        build_configuration_id, count
    )
}

/// Build-data provider backed by a TeamCity server.
pub struct TeamCityClient {
    config: TeamCityConfig,
    http_client: reqwest::Client,
}

impl TeamCityClient {
    /// Create a client for the given server.
    pub fn new(config: TeamCityConfig) -> ProviderResult<Self> {
        info!("Using TeamCity server at {}", config.base_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// URL of the builds endpoint, honouring the authentication mode.
    pub fn builds_url(&self) -> String {
        let auth_prefix = if self.config.username.is_some() {
            "httpAuth"
        } else {
            "guestAuth"
        };
        format!(
            "{}/{}/app/rest/builds",
            self.config.base_url.trim_end_matches('/'),
            auth_prefix
        )
    }
}

#[async_trait]
impl BuildDataProvider for TeamCityClient {
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        count: usize,
    ) -> ProviderResult<Vec<Build>> {
        let url = self.builds_url();
        let locator = build_locator(build_configuration_id, count);
        debug!("GET {} locator={}", url, locator);

        let mut request = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("locator", locator.as_str()), ("fields", BUILD_FIELDS)]);

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let builds = parse_builds_response(&body)?;

        debug!(
            "Fetched {} builds of {}",
            builds.len(),
            build_configuration_id
        );

        Ok(builds)
    }
}

impl TeamCityClient {
    fn classify(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout_seconds)
        } else {
            ProviderError::Http(err)
        }
    }
}
