use async_trait::async_trait;

use quote_core::db::{DbConfig, RepositoryFactory};
use quote_core::{QuoteRepository, RepositoryError};

use crate::SqliteRepository;

/// Registers the SQLite backend under the name `"sqlite"`.
///
/// The connection string is a file path (`quotes.db`), `:memory:`, or a
/// full `sqlite:` URL. File-backed databases are created on first open and
/// migrations run before the repository is handed out.
pub struct SqliteRepositoryFactory;

fn database_url(connection_string: &str) -> String {
    if connection_string.starts_with("sqlite:") {
        connection_string.to_string()
    } else if connection_string == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{connection_string}?mode=rwc")
    }
}

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn QuoteRepository>, RepositoryError> {
        let url = database_url(&config.connection_string);
        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use quote_core::db::RepositoryRegistry;

    use super::*;

    #[test]
    fn plain_paths_become_create_if_missing_urls() {
        assert_eq!(database_url("quotes.db"), "sqlite:quotes.db?mode=rwc");
        assert_eq!(database_url(":memory:"), "sqlite::memory:");
        assert_eq!(database_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn registry_creates_a_working_repository() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(SqliteRepositoryFactory));

        let repo = registry.create(&Default::default()).await.unwrap();

        assert!(repo.load_quotations("user-1").await.unwrap().is_empty());
    }
}
