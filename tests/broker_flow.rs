//! End-to-end broker tests.
//!
//! The mock-backed tests run everywhere. The `op` flow test runs the real
//! 1Password backend against a small shell script standing in for the CLI,
//! so it is Unix-only.

#![cfg(feature = "mock")]

use credmux::backends::mock::{MockBackend, MockCall};
use credmux::{
    BrokerConfig, CredentialSource, EnvironmentHardener, FieldMap, ItemCategory, ItemRecord,
    Provider, ProviderResolver, SecretBroker,
};
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn stored_credentials_resolve_through_provider() {
    let broker = SecretBroker::new(MockBackend::new(), BrokerConfig::new().with_prefix("lab"));

    let mut fields = FieldMap::new();
    fields.insert("api_key".to_string(), "lk_stored".to_string());
    assert!(
        broker
            .store("lab-lambda-cloud-validation", &fields, ItemCategory::ApiCredential)
            .await
    );

    let resolver = ProviderResolver::with_env(&broker, env(&[("LAMBDA_CLOUD_API_KEY", "lk_env")]));
    let resolved = resolver
        .resolve::<credmux::LambdaCloudCredentials>()
        .await
        .unwrap();

    assert_eq!(resolved.source, CredentialSource::Backend);
    assert_eq!(resolved.credential.api_key, "lk_stored");
    assert_eq!(
        resolved.credential.endpoint,
        "https://cloud.lambdalabs.com/api/v1"
    );
}

#[tokio::test]
async fn unavailable_backend_uses_environment_without_invocations() {
    let broker =
        SecretBroker::with_availability(MockBackend::unavailable(), BrokerConfig::new(), false);
    let resolver = ProviderResolver::with_env(
        &broker,
        env(&[
            ("AWS_ACCESS_KEY_ID", "AKIAENV"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("HF_TOKEN", "hf_env"),
        ]),
    );

    let aws = resolver.get_aws_credentials().await.unwrap();
    assert_eq!(aws.aws_region, "us-east-1");
    assert_eq!(
        resolver.get_huggingface_credentials().await.unwrap().token,
        "hf_env"
    );
    assert!(resolver.get_gcp_credentials().await.is_none());
    assert!(broker.backend().calls().is_empty());
}

#[tokio::test]
async fn one_probe_serves_every_provider() {
    let backend = MockBackend::new();
    backend.set_item(
        ItemRecord::new("clustrix-huggingface-validation")
            .with_field("token", "hf_field")
            .with_notes("# rotated monthly\n- username: alice"),
    );
    let broker = SecretBroker::new(backend, BrokerConfig::new());
    let report = ProviderResolver::with_env(&broker, env(&[])).status().await;

    let probes = broker
        .backend()
        .calls()
        .into_iter()
        .filter(|c| *c == MockCall::ListAccounts)
        .count();
    assert_eq!(probes, 1);

    let hub = report
        .iter()
        .find(|s| s.provider == Provider::HuggingFace)
        .unwrap();
    assert_eq!(hub.source, Some(CredentialSource::Backend));
    assert!(report
        .iter()
        .filter(|s| s.provider != Provider::HuggingFace)
        .all(|s| s.source.is_none()));

    let creds = ProviderResolver::with_env(&broker, env(&[]))
        .get_huggingface_credentials()
        .await
        .unwrap();
    assert_eq!(creds.username, "alice");
}

#[tokio::test]
async fn hardening_twice_is_idempotent() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ignore = work.path().join(".gitignore");
    std::fs::write(&ignore, "/target\n").unwrap();
    let hardener = EnvironmentHardener::with_paths(home.path(), work.path());

    let first = hardener.ensure().await.unwrap();
    let after_first = std::fs::read_to_string(&ignore).unwrap();
    let second = hardener.ensure().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&ignore).unwrap(), after_first);
    assert_eq!(
        after_first
            .lines()
            .filter(|l| *l == credmux::hardening::IGNORE_SENTINEL)
            .count(),
        1
    );
}

#[cfg(all(unix, feature = "onepassword"))]
mod op_cli {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    const ITEM_JSON: &str = r#"{"id":"i1","title":"clustrix-aws-validation","category":"API_CREDENTIAL","fields":[{"id":"a1","type":"STRING","label":"aws_access_key_id","value":"AKIAFAKE"},{"id":"a2","type":"CONCEALED","label":"aws_secret_access_key","value":"fake-secret"},{"id":"notesPlain","type":"STRING","label":"notesPlain","value":"- region: eu-west-1"}]}"#;

    /// Writes a stand-in `op` that logs its arguments and answers the four
    /// subcommands the broker uses.
    fn fake_op(dir: &Path) -> std::path::PathBuf {
        let log = dir.join("calls.log");
        let script = format!(
            r#"#!/bin/sh
echo "$*" >> '{log}'
case "$1 $2" in
  "account list") exit 0 ;;
  "item create") exit 0 ;;
  "item get")
    if [ "$3" != "clustrix-aws-validation" ]; then
      echo "[ERROR] \"$3\" isn't an item in the \"Private\" vault" >&2
      exit 1
    fi
    case "$*" in
      *--format*) echo '{json}' ;;
      *) echo "  AKIAFAKE  " ;;
    esac
    ;;
esac
"#,
            log = log.display(),
            json = ITEM_JSON,
        );
        let path = dir.join("op");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn logged_calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    // One test so that no other test forks while the script is being written.
    #[tokio::test]
    async fn op_cli_flow() {
        let missing = SecretBroker::onepassword(
            BrokerConfig::new().with_program("definitely-not-op-12345"),
        );
        assert!(!missing.is_available().await);
        assert!(missing.get_structured("clustrix-aws-validation").await.is_none());
        assert!(!missing.store("x", &FieldMap::new(), ItemCategory::default()).await);

        let dir = tempfile::tempdir().unwrap();
        let program = fake_op(dir.path());
        let config = BrokerConfig::new().with_program(program.display().to_string());
        let broker = SecretBroker::onepassword(config);

        let field = broker
            .get_field("clustrix-aws-validation", "aws_access_key_id")
            .await;
        assert_eq!(field.as_deref(), Some("AKIAFAKE"));

        let resolver = ProviderResolver::with_env(&broker, env(&[]));
        let aws = resolver.get_aws_credentials().await.unwrap();
        assert_eq!(aws.aws_access_key_id, "AKIAFAKE");
        assert_eq!(aws.aws_secret_access_key, "fake-secret");
        assert_eq!(aws.aws_region, "eu-west-1");

        assert!(broker.get_structured("missing-item").await.is_none());

        let mut fields = FieldMap::new();
        fields.insert("token".to_string(), "t".to_string());
        assert!(broker.store("new-item", &fields, ItemCategory::Password).await);

        let calls = logged_calls(dir.path());
        assert_eq!(calls.iter().filter(|c| *c == "account list").count(), 1);
        assert!(calls.contains(
            &"item get clustrix-aws-validation --vault Private --format json --reveal".to_string()
        ));
        assert!(calls.contains(
            &"item create --category PASSWORD --vault Private --title new-item token=t".to_string()
        ));
    }
}
