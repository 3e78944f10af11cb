//! Destination registry
//!
//! A static table of `destination -> factory` registrations, filled at
//! startup, plus a cache of built handlers. The cache is scoped per
//! `(user, session)` so each session builds a destination's handler at most
//! once; callers without ids share the default scope.

use crate::orchestrator::capability::DestinationCapability;
use crate::orchestrator::handler::{Handler, HandlerConfig, HandlerError, HandlerFactory};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_USER: &str = "default_user";
const DEFAULT_SESSION: &str = "default_session";

/// Cache scope for handler instances
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    /// User identifier (or `default_user`)
    pub user_id: String,
    /// Session identifier (or `default_session`)
    pub session_id: String,
}

impl SessionKey {
    /// Build a key, substituting defaults for absent ids
    pub fn new(user_id: Option<&str>, session_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.unwrap_or(DEFAULT_USER).to_string(),
            session_id: session_id.unwrap_or(DEFAULT_SESSION).to_string(),
        }
    }
}

/// One entry of the registration table
#[derive(Clone)]
pub struct DestinationRegistration {
    /// Destination identifier
    pub name: String,
    /// Capability shown to the extraction model
    pub capability: DestinationCapability,
    factory: HandlerFactory,
}

/// Per-session cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCacheStats {
    /// Number of cached handlers
    pub agent_count: usize,
    /// Cached destination names, sorted
    pub agents: Vec<String>,
}

/// Snapshot of the handler cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of session scopes with cached handlers
    pub total_sessions: usize,
    /// Per-scope detail keyed by `"user:session"`
    pub sessions: BTreeMap<String, SessionCacheStats>,
}

type HandlerCache = HashMap<SessionKey, HashMap<String, Arc<dyn Handler>>>;

/// Maps destination identifiers to handlers
pub struct DestinationRegistry {
    registrations: Vec<DestinationRegistration>,
    config: HandlerConfig,
    cache: Mutex<HandlerCache>,
}

impl DestinationRegistry {
    /// Start a registration table
    pub fn builder() -> DestinationRegistryBuilder {
        DestinationRegistryBuilder::default()
    }

    /// Registrations in the order they were added
    pub fn registrations(&self) -> &[DestinationRegistration] {
        &self.registrations
    }

    /// Look up a registration by destination name
    pub fn registration(&self, destination: &str) -> Option<&DestinationRegistration> {
        self.registrations.iter().find(|r| r.name == destination)
    }

    /// True when `destination` has a registered factory
    pub fn contains(&self, destination: &str) -> bool {
        self.registration(destination).is_some()
    }

    /// Config handed to factories
    pub fn handler_config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Same registration table under a new handler config, with an empty cache
    pub fn rebuild(&self, config: HandlerConfig) -> DestinationRegistry {
        DestinationRegistry {
            registrations: self.registrations.clone(),
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached handler for `destination`, building it on first use
    ///
    /// # Returns
    /// * `Some(handler)` - cached or newly built handler
    /// * `None` - destination is not registered, or its factory failed
    pub async fn get_or_create(
        &self,
        destination: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Option<Arc<dyn Handler>> {
        let key = SessionKey::new(user_id, session_id);

        // Held across construction so one scope never builds a destination twice
        let mut cache = self.cache.lock().await;
        if let Some(handler) = cache.get(&key).and_then(|scope| scope.get(destination)) {
            return Some(handler.clone());
        }

        let Some(registration) = self.registration(destination) else {
            tracing::warn!(destination = %destination, "Destination is not registered");
            return None;
        };

        match (registration.factory)(&self.config) {
            Ok(handler) => {
                tracing::info!(
                    destination = %destination,
                    user_id = %key.user_id,
                    session_id = %key.session_id,
                    handler_type = %handler.handler_type(),
                    "Created destination handler"
                );
                cache
                    .entry(key)
                    .or_default()
                    .insert(destination.to_string(), handler.clone());
                Some(handler)
            }
            Err(e) => {
                tracing::error!(
                    destination = %destination,
                    error = %e,
                    "Failed to create destination handler"
                );
                None
            }
        }
    }

    /// Drop every cached handler of one session scope
    ///
    /// Returns true if the scope existed.
    pub async fn clear_session(&self, user_id: Option<&str>, session_id: Option<&str>) -> bool {
        let key = SessionKey::new(user_id, session_id);
        let removed = self.cache.lock().await.remove(&key).is_some();
        if removed {
            tracing::info!(
                user_id = %key.user_id,
                session_id = %key.session_id,
                "Cleared session handler cache"
            );
        }
        removed
    }

    /// Current cache contents
    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock().await;
        let sessions = cache
            .iter()
            .map(|(key, handlers)| {
                let mut agents: Vec<String> = handlers.keys().cloned().collect();
                agents.sort();
                (
                    format!("{}:{}", key.user_id, key.session_id),
                    SessionCacheStats {
                        agent_count: agents.len(),
                        agents,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        CacheStats {
            total_sessions: sessions.len(),
            sessions,
        }
    }
}

/// Collects registrations before the registry is frozen
#[derive(Default)]
pub struct DestinationRegistryBuilder {
    registrations: Vec<DestinationRegistration>,
}

impl DestinationRegistryBuilder {
    /// Register a destination; a later registration replaces an earlier one
    /// with the same name
    pub fn register<F>(mut self, name: impl Into<String>, capability: DestinationCapability, factory: F) -> Self
    where
        F: Fn(&HandlerConfig) -> Result<Arc<dyn Handler>, HandlerError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.registrations.retain(|r| r.name != name);
        self.registrations.push(DestinationRegistration {
            name,
            capability,
            factory: Arc::new(factory),
        });
        self
    }

    /// Freeze the table
    pub fn build(self, config: HandlerConfig) -> DestinationRegistry {
        DestinationRegistry {
            registrations: self.registrations,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::completion::ScriptedCompletion;
    use crate::orchestrator::handler::{HandlerRequest, HandlerResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        fn handler_type(&self) -> &str {
            "EchoHandler"
        }

        async fn invoke(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
            Ok(HandlerResponse::Text(request.instruction))
        }
    }

    fn capability(name: &str) -> DestinationCapability {
        DestinationCapability {
            agent_type: name.to_string(),
            description: format!("{} destination", name),
            primary_domains: vec![],
            key_functions: vec![],
            example_commands: vec![],
            collaboration_needs: vec![],
        }
    }

    fn config() -> HandlerConfig {
        HandlerConfig::new(Arc::new(ScriptedCompletion::new("[]")))
    }

    fn counting_registry(builds: Arc<AtomicUsize>) -> DestinationRegistry {
        DestinationRegistry::builder()
            .register("Echo", capability("Echo"), move |_| {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(EchoHandler) as Arc<dyn Handler>)
            })
            .register("Broken", capability("Broken"), |_| {
                Err(HandlerError::Construction("missing credentials".to_string()))
            })
            .build(config())
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_instance() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(builds.clone());

        let first = registry.get_or_create("Echo", None, None).await.unwrap();
        let second = registry.get_or_create("Echo", None, None).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_scopes_by_session() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(builds.clone());

        registry.get_or_create("Echo", Some("u1"), Some("s1")).await.unwrap();
        registry.get_or_create("Echo", Some("u1"), Some("s2")).await.unwrap();
        registry.get_or_create("Echo", Some("u1"), Some("s1")).await.unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_destination_returns_none() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        assert!(registry.get_or_create("Nope", None, None).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_construction_returns_none_and_is_not_cached() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        assert!(registry.get_or_create("Broken", None, None).await.is_none());
        assert_eq!(registry.cache_stats().await.total_sessions, 0);
    }

    #[tokio::test]
    async fn test_clear_session_and_stats() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        registry.get_or_create("Echo", Some("alice"), Some("s1")).await;
        registry.get_or_create("Echo", None, None).await;

        let stats = registry.cache_stats().await;
        assert_eq!(stats.total_sessions, 2);
        let alice = &stats.sessions["alice:s1"];
        assert_eq!(alice.agent_count, 1);
        assert_eq!(alice.agents, vec!["Echo".to_string()]);
        assert!(stats.sessions.contains_key("default_user:default_session"));

        assert!(registry.clear_session(Some("alice"), Some("s1")).await);
        assert!(!registry.clear_session(Some("alice"), Some("s1")).await);
        assert_eq!(registry.cache_stats().await.total_sessions, 1);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = DestinationRegistry::builder()
            .register("Echo", capability("First"), |_| Ok(Arc::new(EchoHandler) as Arc<dyn Handler>))
            .register("Echo", capability("Second"), |_| Ok(Arc::new(EchoHandler) as Arc<dyn Handler>))
            .build(config());

        assert_eq!(registry.registrations().len(), 1);
        assert_eq!(registry.registration("Echo").unwrap().capability.agent_type, "Second");
        assert!(registry.contains("Echo"));
        assert!(!registry.contains("Other"));
    }

    #[tokio::test]
    async fn test_rebuild_keeps_table_and_drops_cache() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        registry.get_or_create("Echo", None, None).await;

        let mut config = config();
        config.tracing_enabled = true;
        let rebuilt = registry.rebuild(config);

        let names: Vec<&str> = rebuilt.registrations().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Echo", "Broken"]);
        assert!(rebuilt.handler_config().tracing_enabled);
        assert_eq!(rebuilt.cache_stats().await.total_sessions, 0);
    }
}
