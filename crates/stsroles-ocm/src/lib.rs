//! Client for the OpenShift Cluster Manager clusters API.
//!
//! Provides cluster lookup by ID, name or external ID, and the STS policy
//! catalog with its default version.

pub mod model;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use stsroles_core::paginate::{Page, PageLimits, collect_pages};
use stsroles_core::{Cluster, OcmConfig, PolicyVersion};
use stsroles_policy::PolicyCatalog;
use stsroles_runtime::ClusterLookup;

use model::{ClusterItem, List, StsPolicyItem, VersionRef};

const CLUSTERS_PATH: &str = "/api/clusters_mgmt/v1/clusters";
const STS_POLICIES_PATH: &str = "/api/clusters_mgmt/v1/aws_inquiries/sts_policies";
const VERSIONS_PATH: &str = "/api/clusters_mgmt/v1/versions";

pub struct OcmClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    limits: PageLimits,
}

impl OcmClient {
    pub fn new(config: &OcmConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("stsroles/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building OCM HTTP client")?;
        let token = config.resolve_token();
        if token.is_none() {
            tracing::warn!("no OCM token configured; requests will be unauthenticated");
        }
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token,
            limits: config.page_limits(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(%url, ?query, "OCM request");
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        response
            .json()
            .await
            .with_context(|| format!("decoding response of GET {url}"))
    }
}

/// Quote a value for an OCM search expression.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn cluster_search(key: &str) -> String {
    let key = quote(key);
    format!("id = {key} or name = {key} or external_id = {key}")
}

#[async_trait]
impl ClusterLookup for OcmClient {
    async fn find_cluster(&self, key: &str) -> anyhow::Result<Option<Cluster>> {
        let list: List<ClusterItem> = self
            .get(
                CLUSTERS_PATH,
                &[("search", cluster_search(key)), ("size", "1".to_string())],
            )
            .await?;
        if list.total > 1 {
            anyhow::bail!("cluster key '{key}' matches {} clusters", list.total);
        }
        Ok(list.items.into_iter().next().map(Cluster::from))
    }
}

#[async_trait]
impl PolicyCatalog for OcmClient {
    async fn get_policies(&self, role_kind: &str) -> anyhow::Result<BTreeMap<String, Value>> {
        let search = format!("policy_type = {}", quote(role_kind));
        let page_size = self.limits.page_size;
        let items = collect_pages(self.limits, |page, _| {
            let search = search.clone();
            async move {
                let list: List<StsPolicyItem> = self
                    .get(
                        STS_POLICIES_PATH,
                        &[
                            ("search", search),
                            ("page", page.to_string()),
                            ("size", page_size.to_string()),
                        ],
                    )
                    .await?;
                Ok::<_, anyhow::Error>(Page::numbered(list.items))
            }
        })
        .await?;

        let mut policies = BTreeMap::new();
        for item in items {
            let document: Value = serde_json::from_str(&item.details)
                .with_context(|| format!("policy '{}' has an invalid document", item.id))?;
            policies.insert(item.id, document);
        }
        tracing::debug!(role_kind, count = policies.len(), "fetched policy catalog");
        Ok(policies)
    }

    async fn get_default_version(&self) -> anyhow::Result<PolicyVersion> {
        let list: List<VersionRef> = self
            .get(
                VERSIONS_PATH,
                &[
                    ("search", "default = 'true'".to_string()),
                    ("size", "1".to_string()),
                ],
            )
            .await?;
        let version = list
            .items
            .first()
            .context("OCM reports no default version")?;
        version
            .raw()
            .parse::<PolicyVersion>()
            .map_err(|e| anyhow::anyhow!("default version '{}': {e}", version.raw()))
    }
}
