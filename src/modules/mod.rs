pub mod authors;
pub mod books;

use std::sync::Arc;

use library_authz::BearerToken;
use library_db::{AuthorRepository, BookRepository};
use library_kernel::{settings::Settings, ModuleRegistry};

/// Repository handles shared by the catalog modules.
#[derive(Clone)]
pub struct Catalog {
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
}

impl Catalog {
    /// Use one store for both repositories.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AuthorRepository + BookRepository + 'static,
    {
        Self {
            authors: store.clone(),
            books: store,
        }
    }
}

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, catalog: &Catalog, settings: &Settings) {
    let token = BearerToken::new(settings.auth.bearer_token.clone());

    registry.register(authors::create_module(
        Arc::clone(&catalog.authors),
        token,
    ));
    registry.register(books::create_module(Arc::clone(&catalog.books)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_db::MemoryCatalog;

    #[test]
    fn registers_both_modules() {
        let catalog = Catalog::from_store(Arc::new(MemoryCatalog::new()));
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry, &catalog, &Settings::default());

        assert_eq!(registry.module_count(), 2);
        assert!(registry.get_module("authors").is_some());
        assert!(registry.get_module("books").is_some());
    }

    #[test]
    fn migrations_are_collected_per_module() {
        let catalog = Catalog::from_store(Arc::new(MemoryCatalog::new()));
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry, &catalog, &Settings::default());

        let migrations = registry.collect_migrations();
        let owners: Vec<&str> = migrations.iter().map(|(module, _)| module.as_str()).collect();
        assert_eq!(owners, ["authors", "books"]);
        assert!(migrations[1].1.up.contains("CREATE TABLE IF NOT EXISTS books"));
    }
}
