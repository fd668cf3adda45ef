//! Elasticsearch-backed address store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use elasticsearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    CountParts, Elasticsearch, SearchParts,
};
use tracing::{debug, info};
use url::Url;

use crate::models::Address;

use super::{translate, AddressStore, QueryOp, StoreError, StoreQuery};

/// Index mapping embedded at compile time
const ADDRESSES_MAPPING: &str = include_str!("../../schema/addresses_mapping.json");

/// Single-node Elasticsearch connection scoped to one address index.
#[derive(Clone)]
pub struct EsClient {
    client: Elasticsearch,
    pub index_name: String,
}

impl EsClient {
    /// Connect to a single node and verify the cluster answers.
    pub async fn connect(es_url: &str, index_name: &str) -> Result<Self> {
        let pool = SingleNodeConnectionPool::new(Url::parse(es_url)?);
        let transport = TransportBuilder::new(pool)
            .disable_proxy()
            .build()
            .context("Failed to build Elasticsearch transport")?;

        let client = Self {
            client: Elasticsearch::new(transport),
            index_name: index_name.to_string(),
        };

        let health = client
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .with_context(|| format!("Elasticsearch at {} is unreachable", es_url))?;
        if !health.status_code().is_success() {
            anyhow::bail!(
                "Elasticsearch cluster health returned {}",
                health.status_code()
            );
        }

        Ok(client)
    }

    /// Liveness probe for the health endpoint.
    pub async fn is_healthy(&self) -> bool {
        match self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
        {
            Ok(response) => response.status_code().is_success(),
            Err(_) => false,
        }
    }

    /// Number of documents currently in the index.
    pub async fn doc_count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountParts::Index(&[&self.index_name]))
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        body["count"]
            .as_u64()
            .context("Count response missing count field")
    }

    /// Create the addresses index with its mapping, unless it already exists.
    pub async fn ensure_index(&self) -> Result<()> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.index_name]))
            .send()
            .await?
            .status_code()
            .is_success();

        if exists {
            info!("Index {} already exists, skipping creation", self.index_name);
            return Ok(());
        }

        let mapping: serde_json::Value = serde_json::from_str(ADDRESSES_MAPPING)
            .context("Failed to parse addresses_mapping.json")?;

        info!("Creating index: {}", self.index_name);
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(mapping)
            .send()
            .await
            .context("Failed to create index")?;

        if !response.status_code().is_success() {
            let error_body = response.text().await?;
            anyhow::bail!("Failed to create index: {}", error_body);
        }

        Ok(())
    }
}

/// [`AddressStore`] backed by an Elasticsearch index.
#[derive(Clone)]
pub struct ElasticStore {
    client: EsClient,
}

impl ElasticStore {
    pub fn new(client: EsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AddressStore for ElasticStore {
    async fn fetch(&self, op: QueryOp, query: &StoreQuery) -> Result<Vec<Address>, StoreError> {
        let body = translate::query_to_es_body(query);
        debug!("{} query body: {}", op, body);

        let response = self
            .client
            .client
            .search(SearchParts::Index(&[&self.client.index_name]))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::new(op, e))?;

        let response_body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| StoreError::new(op, e))?;

        if let Some(error) = response_body.get("error") {
            return Err(StoreError::new(op, error));
        }

        let hits = response_body["hits"]["hits"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut records = Vec::with_capacity(hits.len());
        for mut hit in hits {
            let source = hit["_source"].take();
            let address: Address =
                serde_json::from_value(source).map_err(|e| StoreError::new(op, e))?;
            records.push(address);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::ADDRESSES_MAPPING;

    // The embedded mapping must declare the fields every store query sorts
    // and filters on, since ensure_index applies it verbatim at startup.
    #[test]
    fn embedded_mapping_declares_query_fields() {
        let mapping: serde_json::Value = serde_json::from_str(ADDRESSES_MAPPING).unwrap();

        let fields = &mapping["mappings"]["properties"];
        assert_eq!(fields["geometry"]["type"], "geo_point");
        assert_eq!(fields["record_key"]["type"], "long");
        for name in ["street", "number", "postcode", "city", "district", "region"] {
            assert_eq!(
                fields["properties"]["properties"][name]["type"],
                "keyword",
                "missing mapping for properties.{}",
                name
            );
        }
    }
}
