//! Shared fixtures

use normativa_scraper::config::{Config, ScraperConfig, UserAgentConfig};
use normativa_scraper::crawler::{HttpTransport, Transport};
use std::path::Path;
use std::sync::Arc;

pub const TEST_USER_AGENT: &str = "NormativaTest/1.0";

/// Defaults with short timeouts, a test user agent and `root` as output root
pub fn test_config(root: &Path) -> Config {
    let mut config = Config {
        scraper: ScraperConfig {
            request_delay_ms: 0,
            law_delay_ms: 0,
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        user_agent: UserAgentConfig {
            value: TEST_USER_AGENT.to_string(),
        },
        ..Config::default()
    };
    config.output.root = root.to_path_buf();
    config
}

pub fn http_transport(config: &Config) -> Arc<dyn Transport> {
    Arc::new(
        HttpTransport::from_config(&config.user_agent, &config.scraper)
            .expect("Failed to build HTTP client"),
    )
}
