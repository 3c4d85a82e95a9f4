use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Module registry driving the lifecycle of every registered module
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module; modules start in registration order
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Get the number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Initialize every module
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start every module
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop every module in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations = Vec::new();

        for module in &self.modules {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        // Sort by module name and migration ID for deterministic ordering
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "002_index",
                    up: "CREATE INDEX IF NOT EXISTS test_idx ON test (id);",
                },
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE IF NOT EXISTS test (id BIGINT);",
                },
            ]
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    fn test_module(name: &'static str, events: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Module> {
        Arc::new(TestModule {
            name,
            events: Arc::clone(events),
        })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn test_migration_collection_is_sorted() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(test_module("books", &events));
        registry.register(test_module("authors", &events));

        let ids: Vec<(String, &str)> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, migration)| (module, migration.id))
            .collect();

        assert_eq!(
            ids,
            vec![
                ("authors".to_string(), "001_init"),
                ("authors".to_string(), "002_index"),
                ("books".to_string(), "001_init"),
                ("books".to_string(), "002_index"),
            ]
        );
    }

    #[test]
    fn test_get_module_by_name() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(test_module("authors", &events));

        assert!(registry.get_module("authors").is_some());
        assert!(registry.get_module("books").is_none());
        assert_eq!(registry.module_count(), 1);
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        registry.register(test_module("authors", &events));
        registry.register(test_module("books", &events));

        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "start authors".to_string(),
                "start books".to_string(),
                "stop books".to_string(),
                "stop authors".to_string(),
            ]
        );
    }
}
