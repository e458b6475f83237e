// src/config/mod.rs
pub mod trends;

pub use trends::{
    DiscoveryConfig, LlmProviderConfig, MatcherKind, ProvidersConfig, SearchProviderConfig,
    TrendsConfig,
};
