//! Proxy configuration and assignment
//!
//! Sessions ask a [`ProxyProvider`] for a proxy when an account has none
//! yet, or on every login when rotation is enabled. One provider is shared by
//! every session, so implementations must be safe for concurrent use.

use crate::config::ProxyRotation;
use crate::{Error, Result};
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Proxy endpoints applied to the API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub http: String,
    pub https: String,
}

impl ProxyConfig {
    /// Use the same proxy for plain and TLS traffic
    pub fn uniform(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            http: url.clone(),
            https: url,
        }
    }
}

/// A proxy handed out by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAssignment {
    /// Short identifier suitable for status output
    pub identifier: String,
    /// Full proxy URL
    pub url: String,
}

/// Source of proxies for new sessions
#[async_trait]
pub trait ProxyProvider: Send + Sync + std::fmt::Debug {
    /// Pick a usable proxy
    async fn get_proxy(&self) -> Result<ProxyAssignment>;
}

/// Provider backed by a static list of proxy URLs
#[derive(Debug)]
pub struct ProxyPool {
    urls: Vec<String>,
    rotation: ProxyRotation,
    next: AtomicUsize,
}

impl ProxyPool {
    pub fn new(urls: Vec<String>, rotation: ProxyRotation) -> Self {
        Self {
            urls,
            rotation,
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn pick_index(&self) -> usize {
        match self.rotation {
            ProxyRotation::RoundRobin => self.next.fetch_add(1, Ordering::Relaxed) % self.urls.len(),
            ProxyRotation::None | ProxyRotation::Random => {
                rand::rng().random_range(0..self.urls.len())
            }
        }
    }
}

#[async_trait]
impl ProxyProvider for ProxyPool {
    async fn get_proxy(&self) -> Result<ProxyAssignment> {
        if self.urls.is_empty() {
            return Err(Error::proxy("no proxies configured"));
        }

        let index = self.pick_index();
        Ok(ProxyAssignment {
            identifier: index.to_string(),
            url: self.urls[index].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> Vec<String> {
        vec![
            "http://proxy-a:8080".to_string(),
            "http://proxy-b:8080".to_string(),
            "socks5://proxy-c:1080".to_string(),
        ]
    }

    #[test]
    fn test_uniform_proxy_config() {
        let config = ProxyConfig::uniform("http://proxy:3128");
        assert_eq!(config.http, "http://proxy:3128");
        assert_eq!(config.https, "http://proxy:3128");
    }

    #[tokio::test]
    async fn test_round_robin_rotation() {
        let pool = ProxyPool::new(urls(), ProxyRotation::RoundRobin);

        let picked: Vec<String> = [
            pool.get_proxy().await.unwrap(),
            pool.get_proxy().await.unwrap(),
            pool.get_proxy().await.unwrap(),
            pool.get_proxy().await.unwrap(),
        ]
        .into_iter()
        .map(|p| p.identifier)
        .collect();

        assert_eq!(picked, vec!["0", "1", "2", "0"]);
    }

    #[tokio::test]
    async fn test_random_rotation_stays_in_pool() {
        let pool = ProxyPool::new(urls(), ProxyRotation::Random);
        for _ in 0..20 {
            let proxy = pool.get_proxy().await.unwrap();
            assert!(urls().contains(&proxy.url));
        }
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let pool = ProxyPool::new(Vec::new(), ProxyRotation::None);
        assert!(pool.is_empty());
        assert!(matches!(pool.get_proxy().await, Err(Error::Proxy { .. })));
    }
}
