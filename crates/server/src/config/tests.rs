use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config = FilestreamConfig::from_toml("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert!(config.server.public_url.is_none());
    assert!(!config.server.dev);
    assert!(!config.tls.enabled);
    assert_eq!(config.tls.min_version, "1.2");
    assert_eq!(config.cache.max_entries, 10_000);
    assert!(config.cache.ttl().is_none());
    assert_eq!(config.links.hash_length, 16);
    assert!(config.links.secret.is_none());
    assert_eq!(config.workers.backend, "memory");
    assert_eq!(config.workers.fetch_timeout_seconds, 30);
    assert!(config.workers.memory.files.is_empty());
}

#[test]
fn public_url_falls_back_to_bind_address() {
    let config = FilestreamConfig::from_toml("[server]\nport = 9000").unwrap();
    assert_eq!(
        config.server.resolved_public_url(false),
        "http://127.0.0.1:9000"
    );
    assert_eq!(
        config.server.resolved_public_url(true),
        "https://127.0.0.1:9000"
    );
}

#[test]
fn explicit_public_url_wins() {
    let toml = r#"
        [server]
        public_url = "https://media.example.com"
    "#;
    let config = FilestreamConfig::from_toml(toml).unwrap();
    assert_eq!(
        config.server.resolved_public_url(true),
        "https://media.example.com"
    );
}

#[test]
fn full_config_parses() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 443
        dev = true
        lookup_public_ip = false

        [tls]
        enabled = true
        cert_path = "/etc/ssl/filestream.crt"
        key_path = "/etc/ssl/filestream.key"

        [cache]
        max_entries = 500
        ttl_seconds = 3600

        [links]
        hash_length = 24
        secret = "s3cret"

        [workers]
        backend = "http"
        fetch_timeout_seconds = 10

        [workers.http]
        base_url = "http://bridge:8081"
        primary_token = "main"
        additional_tokens = ["w1", "w2"]
        timeout_seconds = 5
    "#;
    let config = FilestreamConfig::from_toml(toml).unwrap();
    assert_eq!(config.server.port, 443);
    assert!(config.server.dev);
    assert!(!config.server.lookup_public_ip);
    assert!(config.tls.enabled);
    assert_eq!(
        config.tls.cert_path.as_deref(),
        Some("/etc/ssl/filestream.crt")
    );
    assert_eq!(config.cache.ttl(), Some(std::time::Duration::from_secs(3600)));
    assert_eq!(config.links.hash_length, 24);
    assert_eq!(config.workers.backend, "http");
    assert_eq!(
        config.workers.fetch_timeout(),
        std::time::Duration::from_secs(10)
    );
    assert_eq!(config.workers.http.primary_token.as_deref(), Some("main"));
    assert_eq!(config.workers.http.additional_tokens, vec!["w1", "w2"]);
    assert_eq!(config.workers.http.timeout_seconds, 5);
}

#[test]
fn memory_files_parse() {
    let toml = r#"
        [workers.memory]
        additional = 2

        [[workers.memory.files]]
        message_id = 7
        path = "media/clip.mp4"
        mime_type = "video/mp4"
    "#;
    let config = FilestreamConfig::from_toml(toml).unwrap();
    assert_eq!(config.workers.memory.additional, 2);
    let file = &config.workers.memory.files[0];
    assert_eq!(file.message_id, 7);
    assert_eq!(file.path, "media/clip.mp4");
    assert!(file.file_name.is_none());
    assert_eq!(file.mime_type, "video/mp4");
}

#[test]
fn invalid_toml_is_a_config_error() {
    let err = FilestreamConfig::from_toml("[server]\nport = \"eighty\"").unwrap_err();
    assert!(matches!(err, crate::error::ServerError::Config(_)));
}

#[test]
fn links_codec_uses_configured_length() {
    let config = FilestreamConfig::from_toml("[links]\nhash_length = 20").unwrap();
    let codec = config.links.codec(None).unwrap();
    assert_eq!(codec.length(), 20);
    assert!(!codec.is_keyed());
}

#[test]
fn links_secret_override_wins() {
    let config = FilestreamConfig::from_toml("[links]\nsecret = \"from-file\"").unwrap();
    assert!(config.links.codec(None).unwrap().is_keyed());
    assert!(
        config
            .links
            .codec(Some("from-env".into()))
            .unwrap()
            .is_keyed()
    );

    let empty = FilestreamConfig::from_toml("[links]\nsecret = \"\"").unwrap();
    assert!(!empty.links.codec(None).unwrap().is_keyed());
}

#[test]
fn links_reject_short_hashes() {
    let config = FilestreamConfig::from_toml("[links]\nhash_length = 8").unwrap();
    assert!(config.links.codec(None).is_err());
}

#[test]
fn telemetry_defaults_to_local_logging() {
    let config = FilestreamConfig::from_toml("").unwrap();
    assert!(config.telemetry.log_filter.is_none());
    assert!(config.telemetry.otlp.is_none());
}

#[test]
fn otlp_section_fills_defaults() {
    let toml = r#"
        [telemetry]
        log_filter = "warn,filestream_gateway=debug"

        [telemetry.otlp]
        protocol = "http"
        sample_ratio = 0.5

        [telemetry.otlp.resource_attributes]
        "deployment.environment" = "staging"
    "#;
    let config = FilestreamConfig::from_toml(toml).unwrap();
    assert_eq!(
        config.telemetry.log_filter.as_deref(),
        Some("warn,filestream_gateway=debug")
    );
    let otlp = config.telemetry.otlp.unwrap();
    assert_eq!(otlp.endpoint, "http://localhost:4317");
    assert_eq!(otlp.protocol, OtlpProtocol::Http);
    assert_eq!(otlp.service_name, "filestream");
    assert!((otlp.sample_ratio - 0.5).abs() < f64::EPSILON);
    assert_eq!(otlp.timeout(), std::time::Duration::from_secs(10));
    assert_eq!(
        otlp.resource_attributes.get("deployment.environment").unwrap(),
        "staging"
    );
}

#[test]
fn unknown_otlp_protocol_is_rejected() {
    let toml = "[telemetry.otlp]\nprotocol = \"carrier\"";
    assert!(FilestreamConfig::from_toml(toml).is_err());
}

#[test]
fn load_missing_file_returns_defaults() {
    let (config, found) =
        FilestreamConfig::load("/nonexistent/filestream-test/filestream.toml").unwrap();
    assert!(!found);
    assert_eq!(config.server.port, 8080);
}
