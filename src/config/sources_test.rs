use super::*;

fn full_env() -> MapEnv {
    MapEnv::from_pairs([
        (ENV_USER_POOL_ID, "eu-west-1_env"),
        (ENV_USER_POOL_CLIENT_ID, "env-client"),
        (ENV_REGION, "eu-west-1"),
    ])
}

#[test]
fn identity_from_env_reads_all_fields() {
    let cfg = identity_from_env(&full_env()).unwrap();
    assert_eq!(cfg.pool_id, "eu-west-1_env");
    assert_eq!(cfg.client_id, "env-client");
    assert_eq!(cfg.region, "eu-west-1");
}

#[test]
fn identity_from_env_rejects_partial_config() {
    let env = MapEnv::from_pairs([(ENV_USER_POOL_ID, "eu-west-1_env"), (ENV_REGION, "eu-west-1")]);
    assert!(identity_from_env(&env).is_none());
    assert!(identity_from_env(&MapEnv::new()).is_none());
}

#[test]
fn shared_globals_publish_is_visible_to_later_snapshots() {
    let globals = SharedGlobals::new();
    assert!(globals.snapshot().identity_config().is_none());

    globals.publish(PageGlobals {
        user_pool_id: Some("pool".into()),
        user_pool_client_id: Some("client".into()),
        region: Some("us-east-1".into()),
        ..PageGlobals::default()
    });
    assert_eq!(globals.snapshot().identity_config().unwrap().pool_id, "pool");
}

#[test]
fn http_fetcher_targets_config_path_under_origin() {
    let fetcher = HttpConfigFetcher::new("https://abbey.example.org/").unwrap();
    assert_eq!(fetcher.url(), "https://abbey.example.org/api/config.json");
}

#[test]
fn parse_remote_config_accepts_identity_fields() {
    let remote = parse_remote_config(
        r#"{"baseUrl":"https://api.example.org","userPoolId":"p","userPoolClientId":"c","region":"r"}"#,
    )
    .unwrap();
    assert_eq!(remote.identity_config().unwrap().client_id, "c");
}

#[test]
fn parse_remote_config_rejects_garbage() {
    let err = parse_remote_config("<html>not json</html>").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
