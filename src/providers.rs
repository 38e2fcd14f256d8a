//! Provider credential resolution.
//!
//! Each provider has a fixed backend item (`<prefix>-<slug>-validation`) and
//! a fixed set of environment variables. Resolution always tries the backend
//! first; if the backend returns the item, its fields are reshaped into the
//! provider's credential and the environment is never consulted. Otherwise
//! the environment must supply every required variable, or the credential is
//! absent.
//!
//! ```no_run
//! use credmux::{BrokerConfig, ProviderResolver, SecretBroker};
//!
//! # async fn run() {
//! let broker = SecretBroker::onepassword(BrokerConfig::new());
//! let resolver = ProviderResolver::new(&broker);
//!
//! if let Some(aws) = resolver.get_aws_credentials().await {
//!     println!("using region {}", aws.aws_region);
//! }
//! # }
//! ```

use crate::env::{EnvLookup, ProcessEnv};
use crate::{Backend, FieldMap, SecretBroker};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default AWS region.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
/// Default GCP region.
pub const DEFAULT_GCP_REGION: &str = "us-central1";
/// Default Lambda Cloud API endpoint.
pub const DEFAULT_LAMBDA_ENDPOINT: &str = "https://cloud.lambdalabs.com/api/v1";
/// Default container registry.
pub const DEFAULT_DOCKER_REGISTRY: &str = "docker.io";
/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// External services with a credential shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Amazon Web Services
    Aws,
    /// Google Cloud Platform
    Gcp,
    /// Lambda Cloud GPU instances
    LambdaCloud,
    /// Hugging Face model hub
    HuggingFace,
    /// Container registry
    Docker,
    /// Generic SSH target
    Ssh,
}

impl Provider {
    /// Every provider, in reporting order.
    pub const ALL: [Provider; 6] = [
        Provider::Aws,
        Provider::Gcp,
        Provider::LambdaCloud,
        Provider::HuggingFace,
        Provider::Docker,
        Provider::Ssh,
    ];

    /// Slug used in the backend item name.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::LambdaCloud => "lambda-cloud",
            Self::HuggingFace => "huggingface",
            Self::Docker => "docker",
            Self::Ssh => "ssh",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// The secret backend
    Backend,
    /// Process environment variables
    Environment,
}

/// A credential together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<C> {
    /// The credential
    pub credential: C,
    /// Where it came from
    pub source: CredentialSource,
}

/// Resolution outcome for one provider, without the credential values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Provider
    pub provider: Provider,
    /// Source the credential resolved from, if any
    pub source: Option<CredentialSource>,
}

/// A provider-shaped credential.
pub trait ProviderCredential: Sized {
    /// Provider this credential belongs to.
    const PROVIDER: Provider;

    /// Reshapes backend fields. Missing fields become empty (or their
    /// documented default); this never fails.
    fn from_fields(fields: &FieldMap) -> Self;

    /// Assembles the credential from the environment, or `None` if any
    /// required variable is unset or empty.
    fn from_env(env: &dyn EnvLookup) -> Option<Self>;
}

fn text(fields: &FieldMap, key: &str) -> String {
    fields.get(key).cloned().unwrap_or_default()
}

fn text_or(fields: &FieldMap, key: &str, default: &str) -> String {
    fields
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// AWS access keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    /// Access key id
    pub aws_access_key_id: String,
    /// Secret access key
    pub aws_secret_access_key: String,
    /// Region
    pub aws_region: String,
}

impl ProviderCredential for AwsCredentials {
    const PROVIDER: Provider = Provider::Aws;

    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            aws_access_key_id: text(fields, "aws_access_key_id"),
            aws_secret_access_key: text(fields, "aws_secret_access_key"),
            aws_region: text_or(fields, "region", DEFAULT_AWS_REGION),
        }
    }

    fn from_env(env: &dyn EnvLookup) -> Option<Self> {
        Some(Self {
            aws_access_key_id: env.non_empty("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: env.non_empty("AWS_SECRET_ACCESS_KEY")?,
            aws_region: env
                .non_empty("AWS_DEFAULT_REGION")
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
        })
    }
}

/// GCP service account.
///
/// From the backend the account key is inline in `service_account_json`; from
/// the environment only its file path is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpCredentials {
    /// Project id
    pub project_id: String,
    /// Service account key JSON
    pub service_account_json: String,
    /// Path to the service account key file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_path: Option<String>,
    /// Region
    pub region: String,
}

impl ProviderCredential for GcpCredentials {
    const PROVIDER: Provider = Provider::Gcp;

    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            project_id: text(fields, "project_id"),
            service_account_json: text(fields, "service_account_json"),
            service_account_path: None,
            region: text_or(fields, "region", DEFAULT_GCP_REGION),
        }
    }

    fn from_env(env: &dyn EnvLookup) -> Option<Self> {
        let path = env.non_empty("GOOGLE_APPLICATION_CREDENTIALS")?;
        Some(Self {
            project_id: env.non_empty("GOOGLE_CLOUD_PROJECT").unwrap_or_default(),
            service_account_json: String::new(),
            service_account_path: Some(path),
            region: env
                .non_empty("GOOGLE_CLOUD_REGION")
                .unwrap_or_else(|| DEFAULT_GCP_REGION.to_string()),
        })
    }
}

/// Lambda Cloud API access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaCloudCredentials {
    /// API key
    pub api_key: String,
    /// API endpoint
    pub endpoint: String,
}

impl ProviderCredential for LambdaCloudCredentials {
    const PROVIDER: Provider = Provider::LambdaCloud;

    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            api_key: text(fields, "api_key"),
            endpoint: text_or(fields, "endpoint", DEFAULT_LAMBDA_ENDPOINT),
        }
    }

    fn from_env(env: &dyn EnvLookup) -> Option<Self> {
        Some(Self {
            api_key: env.non_empty("LAMBDA_CLOUD_API_KEY")?,
            endpoint: DEFAULT_LAMBDA_ENDPOINT.to_string(),
        })
    }
}

/// Hugging Face access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuggingFaceCredentials {
    /// Access token
    pub token: String,
    /// Account name
    pub username: String,
}

impl ProviderCredential for HuggingFaceCredentials {
    const PROVIDER: Provider = Provider::HuggingFace;

    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            token: text(fields, "token"),
            username: text(fields, "username"),
        }
    }

    fn from_env(env: &dyn EnvLookup) -> Option<Self> {
        let token = env
            .non_empty("HUGGINGFACE_TOKEN")
            .or_else(|| env.non_empty("HF_TOKEN"))?;
        Some(Self {
            token,
            username: env.non_empty("HUGGINGFACE_USERNAME").unwrap_or_default(),
        })
    }
}

/// Container registry login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerCredentials {
    /// Registry user
    pub username: String,
    /// Password or access token
    pub password: String,
    /// Registry host
    pub registry: String,
}

impl ProviderCredential for DockerCredentials {
    const PROVIDER: Provider = Provider::Docker;

    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            username: text(fields, "username"),
            password: fields
                .get("password")
                .or_else(|| fields.get("token"))
                .cloned()
                .unwrap_or_default(),
            registry: text_or(fields, "registry", DEFAULT_DOCKER_REGISTRY),
        }
    }

    fn from_env(env: &dyn EnvLookup) -> Option<Self> {
        Some(Self {
            username: env.non_empty("DOCKER_USERNAME")?,
            password: env.non_empty("DOCKER_PASSWORD")?,
            registry: env
                .non_empty("DOCKER_REGISTRY")
                .unwrap_or_else(|| DEFAULT_DOCKER_REGISTRY.to_string()),
        })
    }
}

/// SSH login for a remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshCredentials {
    /// Host name or address
    pub hostname: String,
    /// Login user
    pub username: String,
    /// Private key text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Port
    pub port: u16,
}

impl ProviderCredential for SshCredentials {
    const PROVIDER: Provider = Provider::Ssh;

    fn from_fields(fields: &FieldMap) -> Self {
        let port = match fields.get("port") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                debug!(port = %raw, "Ignoring unparsable SSH port");
                DEFAULT_SSH_PORT
            }),
            None => DEFAULT_SSH_PORT,
        };

        Self {
            hostname: fields
                .get("hostname")
                .or_else(|| fields.get("host"))
                .cloned()
                .unwrap_or_default(),
            username: text(fields, "username"),
            private_key: fields.get("private_key").cloned(),
            password: fields.get("password").cloned(),
            port,
        }
    }

    // Host-specific; there is no environment convention to fall back on.
    fn from_env(_env: &dyn EnvLookup) -> Option<Self> {
        None
    }
}

/// Resolves provider credentials through one broker.
///
/// Borrows the broker, so one broker (and its cached availability) serves
/// every lookup.
pub struct ProviderResolver<'a, B, E = ProcessEnv> {
    broker: &'a SecretBroker<B>,
    env: E,
}

impl<'a, B: Backend> ProviderResolver<'a, B, ProcessEnv> {
    /// Creates a resolver that falls back to the process environment.
    pub fn new(broker: &'a SecretBroker<B>) -> Self {
        Self {
            broker,
            env: ProcessEnv,
        }
    }
}

impl<'a, B: Backend, E: EnvLookup> ProviderResolver<'a, B, E> {
    /// Creates a resolver with a custom environment.
    pub fn with_env(broker: &'a SecretBroker<B>, env: E) -> Self {
        Self { broker, env }
    }

    /// Resolves any provider credential, reporting its source.
    pub async fn resolve<C: ProviderCredential>(&self) -> Option<Resolved<C>> {
        let provider = C::PROVIDER;
        let item = self.broker.config().provider_item_name(provider.slug());

        if let Some(fields) = self.broker.get_structured(&item).await {
            debug!(%provider, item = %item, "Credential resolved from backend");
            return Some(Resolved {
                credential: C::from_fields(&fields),
                source: CredentialSource::Backend,
            });
        }

        match C::from_env(&self.env) {
            Some(credential) => {
                debug!(%provider, "Credential resolved from environment");
                Some(Resolved {
                    credential,
                    source: CredentialSource::Environment,
                })
            }
            None => {
                debug!(%provider, "No credential found");
                None
            }
        }
    }

    /// AWS access keys.
    pub async fn get_aws_credentials(&self) -> Option<AwsCredentials> {
        self.resolve::<AwsCredentials>().await.map(|r| r.credential)
    }

    /// GCP service account.
    pub async fn get_gcp_credentials(&self) -> Option<GcpCredentials> {
        self.resolve::<GcpCredentials>().await.map(|r| r.credential)
    }

    /// Lambda Cloud API key.
    pub async fn get_lambda_cloud_credentials(&self) -> Option<LambdaCloudCredentials> {
        self.resolve::<LambdaCloudCredentials>().await.map(|r| r.credential)
    }

    /// Hugging Face token.
    pub async fn get_huggingface_credentials(&self) -> Option<HuggingFaceCredentials> {
        self.resolve::<HuggingFaceCredentials>().await.map(|r| r.credential)
    }

    /// Container registry login.
    pub async fn get_docker_credentials(&self) -> Option<DockerCredentials> {
        self.resolve::<DockerCredentials>().await.map(|r| r.credential)
    }

    /// SSH login; backend only.
    pub async fn get_ssh_credentials(&self) -> Option<SshCredentials> {
        self.resolve::<SshCredentials>().await.map(|r| r.credential)
    }

    /// Resolves every provider and reports where each credential came from.
    pub async fn status(&self) -> Vec<ProviderStatus> {
        let mut report = Vec::with_capacity(Provider::ALL.len());
        for provider in Provider::ALL {
            let source = match provider {
                Provider::Aws => self.resolve::<AwsCredentials>().await.map(|r| r.source),
                Provider::Gcp => self.resolve::<GcpCredentials>().await.map(|r| r.source),
                Provider::LambdaCloud => self
                    .resolve::<LambdaCloudCredentials>()
                    .await
                    .map(|r| r.source),
                Provider::HuggingFace => self
                    .resolve::<HuggingFaceCredentials>()
                    .await
                    .map(|r| r.source),
                Provider::Docker => self.resolve::<DockerCredentials>().await.map(|r| r.source),
                Provider::Ssh => self.resolve::<SshCredentials>().await.map(|r| r.source),
            };
            report.push(ProviderStatus { provider, source });
        }
        report
    }
}
