//! Upstream discovery

use async_trait::async_trait;

use crate::error::DiscoveryError;

/// Source of the current upstream address list.
///
/// The balancer treats `Err` as "no change" and `Ok(vec![])` as "temporarily
/// no upstreams".
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn get(&self) -> Result<Vec<String>, DiscoveryError>;
}

/// Discovery backed by a fixed address list
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    addresses: Vec<String>,
}

impl StaticDiscovery {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn get(&self) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.addresses.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_discovery_returns_list_in_order() {
        let discovery = StaticDiscovery::new(["http://a", "http://b"]);
        assert_eq!(
            discovery.get().await.unwrap(),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }
}
