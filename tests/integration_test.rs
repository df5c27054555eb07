use agentchat::config::Config;

#[test]
fn test_config_validation_rejects_non_http_base_url() {
    let config = Config {
        base_url: "agents.example.com".to_string(),
        agent_id: "default".to_string(),
        enable_skills: false,
        enable_mcp: false,
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_accepts_https_base_url() {
    let config = Config {
        base_url: "https://agents.example.com".to_string(),
        agent_id: "research".to_string(),
        enable_skills: true,
        enable_mcp: true,
    };

    assert!(config.validate().is_ok());
}
