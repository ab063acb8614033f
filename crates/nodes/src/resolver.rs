//! Configuration resolver: one provider attempt per node, defaults otherwise.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{AgentConfig, AgentRole, ConfigProvider, ConfigProviderError, ResolutionContext};
use tracing::{debug, warn};

/// Resolves the [`AgentConfig`] for a node invocation.
///
/// Never fails: if no provider is configured, or the provider errors, times
/// out, or serves an unusable configuration, the built-in default for the
/// role is returned, tagged with the fallback provenance token.
#[derive(Clone)]
pub struct ConfigResolver {
    provider: Option<Arc<dyn ConfigProvider>>,
    timeout: Duration,
}

impl ConfigResolver {
    /// Time allowed for one provider lookup unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a resolver backed by `provider`.
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self {
            provider: Some(provider),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Creates a resolver that always serves the built-in defaults.
    pub fn defaults_only() -> Self {
        Self {
            provider: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the provider lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves the configuration for `role` in `context`.
    pub async fn resolve(&self, role: AgentRole, context: &ResolutionContext) -> AgentConfig {
        let Some(provider) = &self.provider else {
            debug!(agent = %role, "No configuration provider; using default");
            return AgentConfig::fallback(role);
        };

        let agent_id = role.agent_id();
        let lookup = provider.fetch(&agent_id, context);
        let answer = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(answer) => answer,
            Err(_) => Err(ConfigProviderError::Timeout),
        };

        match answer.and_then(|served| served.into_agent_config(&agent_id)) {
            Ok(config) => {
                debug!(
                    agent = %role,
                    provider = provider.name(),
                    provenance = %config.provenance(),
                    model = %config.model(),
                    "Resolved agent configuration"
                );
                config
            }
            Err(error) => {
                warn!(
                    agent = %role,
                    provider = provider.name(),
                    error = %error,
                    "Configuration provider failed; using default"
                );
                AgentConfig::fallback(role)
            }
        }
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline::{AgentId, GenerationParameters, ProviderConfig};
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Behaviour {
        Serve,
        Fail,
        Hang,
        Malformed,
        BrokenTemplate,
    }

    struct StubProvider {
        behaviour: Behaviour,
        calls: AtomicU32,
    }

    impl StubProvider {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ConfigProvider for StubProvider {
        async fn fetch(
            &self,
            agent_id: &AgentId,
            _context: &ResolutionContext,
        ) -> Result<ProviderConfig, ConfigProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Serve => Ok(ProviderConfig {
                    enabled: true,
                    model: Some("claude-3-5-haiku-latest".into()),
                    prompt_template: Some(format!("Served template for {agent_id}")),
                    parameters: GenerationParameters::new(),
                    provenance: Some("variant-b".into()),
                }),
                Behaviour::Fail => {
                    Err(ConfigProviderError::Unavailable("connection refused".into()))
                }
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(ConfigProviderError::Unavailable("unreachable".into()))
                }
                Behaviour::Malformed => Ok(ProviderConfig::default()),
                Behaviour::BrokenTemplate => Ok(ProviderConfig {
                    enabled: true,
                    model: Some("claude-3-5-haiku-latest".into()),
                    prompt_template: Some("Validate {{ idea".into()),
                    parameters: GenerationParameters::new(),
                    provenance: Some("variant-c".into()),
                }),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_served_configuration_is_used() {
        let provider = StubProvider::new(Behaviour::Serve);
        let resolver = ConfigResolver::new(provider.clone());

        let config = resolver
            .resolve(AgentRole::Validator, &ResolutionContext::default())
            .await;

        assert_eq!(config.provenance().as_str(), "variant-b");
        assert_eq!(config.prompt_template(), "Served template for idea-validator");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_role_falls_back_when_provider_fails() {
        for behaviour in [
            Behaviour::Fail,
            Behaviour::Malformed,
            Behaviour::BrokenTemplate,
        ] {
            let provider = StubProvider::new(behaviour);
            let resolver = ConfigResolver::new(provider.clone());
            for role in AgentRole::SEQUENCE {
                let config = resolver.resolve(role, &ResolutionContext::default()).await;
                assert_eq!(config, AgentConfig::fallback(role));
            }
            // One attempt per resolution, no retries.
            assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_to_default() {
        let resolver = ConfigResolver::new(StubProvider::new(Behaviour::Hang))
            .with_timeout(Duration::from_millis(20));

        for role in AgentRole::SEQUENCE {
            let config = resolver.resolve(role, &ResolutionContext::default()).await;
            assert!(config.is_fallback());
            assert_eq!(config.agent_id(), &role.agent_id());
        }
    }

    #[tokio::test]
    async fn test_defaults_only_resolver() {
        let resolver = ConfigResolver::defaults_only();
        let config = resolver
            .resolve(AgentRole::TechStackRecommender, &ResolutionContext::default())
            .await;
        assert_eq!(config, AgentConfig::fallback(AgentRole::TechStackRecommender));
    }
}
