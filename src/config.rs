//! Engine configuration.
//!
//! Every section has a `Default` matching the interactive defaults, and the
//! whole tree deserializes from JSON with missing fields filled in.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Query engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Rows returned when a filter carries no explicit limit.
    pub default_limit: usize,
    /// Hard ceiling on any requested limit.
    pub max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 10_000,
        }
    }
}

/// Pathway post-processing bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayConfig {
    /// Longest reaction chain considered, in reactions.
    pub max_walk_depth: usize,
    /// Maximum walks enumerated before the summary reports truncation.
    pub max_walks: usize,
    /// Entries in the "top products" summary.
    pub top_products: usize,
    /// Hard cap on pathways returned by a view.
    pub max_pathways_shown: usize,
    /// Hard cap on distinct nuclides in a rendered flow graph.
    pub max_graph_nodes: usize,
}

impl Default for PathwayConfig {
    fn default() -> Self {
        Self {
            max_walk_depth: 3,
            max_walks: 100_000,
            top_products: 20,
            max_pathways_shown: 30,
            max_graph_nodes: 50,
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of query workers.
    pub query_workers: usize,
    /// Number of cascade workers.
    pub cascade_workers: usize,
    /// Maximum queued jobs per pool.
    pub queue_capacity: usize,
    /// Buffered progress events per cascade.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            query_workers: 2,
            cascade_workers: 1,
            queue_capacity: 256,
            event_capacity: 1024,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Query limits.
    pub query: QueryConfig,
    /// Pathway bounds.
    pub pathways: PathwayConfig,
    /// Worker pools.
    pub runtime: RuntimeConfig,
}

fn positive(field: &str, value: usize) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidConfig {
            reason: format!("{field} must be > 0"),
        });
    }
    Ok(())
}

impl EngineConfig {
    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("invalid config json: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("query.default_limit", self.query.default_limit)?;
        positive("query.max_limit", self.query.max_limit)?;
        if self.query.default_limit > self.query.max_limit {
            return Err(ValidationError::InvalidConfig {
                reason: "query.default_limit must not exceed query.max_limit".to_string(),
            });
        }
        positive("pathways.max_walk_depth", self.pathways.max_walk_depth)?;
        positive("pathways.max_walks", self.pathways.max_walks)?;
        positive("pathways.top_products", self.pathways.top_products)?;
        positive("pathways.max_pathways_shown", self.pathways.max_pathways_shown)?;
        positive("pathways.max_graph_nodes", self.pathways.max_graph_nodes)?;
        positive("runtime.queue_capacity", self.runtime.queue_capacity)?;
        positive("runtime.event_capacity", self.runtime.event_capacity)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"pathways": {"max_pathways_shown": 10}}"#)
            .unwrap();
        assert_eq!(cfg.pathways.max_pathways_shown, 10);
        assert_eq!(cfg.pathways.max_graph_nodes, 50);
        assert_eq!(cfg.query, QueryConfig::default());
    }

    #[test]
    fn rejects_zero_and_inverted_limits() {
        assert!(EngineConfig::from_json_str(r#"{"query": {"max_limit": 0}}"#).is_err());
        assert!(EngineConfig::from_json_str(
            r#"{"query": {"default_limit": 500, "max_limit": 100}}"#
        )
        .is_err());
        assert!(EngineConfig::from_json_str("not json").is_err());
    }
}
