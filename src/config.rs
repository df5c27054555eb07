use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::util::parse_bool_flag;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub agent_id: String,
    pub enable_skills: bool,
    pub enable_mcp: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let base_url = std::env::var("ACHAT_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        let agent_id = std::env::var("ACHAT_AGENT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "default".to_string());
        let enable_skills = std::env::var("ACHAT_ENABLE_SKILLS")
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);
        let enable_mcp = std::env::var("ACHAT_ENABLE_MCP")
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);

        Ok(Self {
            base_url,
            agent_id,
            enable_skills,
            enable_mcp,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!(
                "Invalid ACHAT_BASE_URL '{}': expected http:// or https:// URL",
                self.base_url
            );
        }

        if self.agent_id.trim().is_empty() {
            bail!("ACHAT_AGENT must not be empty");
        }

        Ok(())
    }
}
