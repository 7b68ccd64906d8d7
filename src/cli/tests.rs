#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["idea-validator"]).unwrap();

        assert_eq!(args.config, None);
        assert_eq!(args.bind, None);
        assert!(!args.verbose);
        assert!(!args.no_history);
        assert!(!args.enable_transcription);
        assert_eq!(args.llm_provider, None);
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "idea-validator",
            "-c",
            "/etc/validator.toml",
            "-b",
            "0.0.0.0:9000",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/validator.toml")));
        assert_eq!(args.bind, Some("0.0.0.0:9000".to_string()));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "idea-validator",
            "--llm-provider",
            "openai",
            "--model",
            "gpt-4o-mini",
            "--llm-api-key",
            "test-key",
            "--llm-api-base-url",
            "https://api.openai.com/v1",
            "--llm-timeout",
            "45",
        ])
        .unwrap();

        assert_eq!(args.llm_provider, Some("openai".to_string()));
        assert_eq!(args.model, Some("gpt-4o-mini".to_string()));
        assert_eq!(args.llm_api_key, Some("test-key".to_string()));
        assert_eq!(
            args.llm_api_base_url,
            Some("https://api.openai.com/v1".to_string())
        );
        assert_eq!(args.llm_timeout, Some(45));
    }

    #[test]
    fn test_into_config_with_overrides() {
        let args = Args::try_parse_from([
            "idea-validator",
            "--bind",
            "0.0.0.0:3000",
            "--llm-provider",
            "anthropic",
            "--model",
            "claude-sonnet-4",
            "--max-concurrency",
            "8",
            "--max-listings",
            "4",
            "--max-reviews",
            "50",
            "--country",
            "GB",
            "--history-path",
            "/tmp/history.jsonl",
            "--enable-transcription",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.model, "claude-sonnet-4");
        assert_eq!(config.discovery.max_concurrency, 8);
        assert_eq!(config.discovery.max_listings, 4);
        assert_eq!(config.discovery.max_reviews_per_listing, 50);
        assert_eq!(config.discovery.country, "gb");
        assert_eq!(config.history.path, PathBuf::from("/tmp/history.jsonl"));
        assert!(config.history.enabled);
        assert!(config.transcription.enabled);
        assert!(config.verbose);
    }

    #[test]
    fn test_into_config_no_history() {
        let args = Args::try_parse_from(["idea-validator", "--no-history"]).unwrap();
        let config = args.into_config().unwrap();
        assert!(!config.history.enabled);
    }

    #[test]
    fn test_into_config_rejects_unknown_provider() {
        let args =
            Args::try_parse_from(["idea-validator", "--llm-provider", "mistral"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_into_config_loads_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validator.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
bind = "127.0.0.1:7000"

[discovery]
max_concurrency = 2
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "idea-validator",
            "--config",
            config_path.to_str().unwrap(),
            "--max-listings",
            "3",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:7000");
        assert_eq!(config.discovery.max_concurrency, 2);
        assert_eq!(config.discovery.max_listings, 3);
    }

    #[test]
    fn test_into_config_missing_explicit_file_fails() {
        let args = Args::try_parse_from([
            "idea-validator",
            "--config",
            "/definitely/not/here/validator.toml",
        ])
        .unwrap();
        assert!(args.into_config().is_err());
    }
}
