use crate::auth::password::PasswordPolicy;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{CourseStore, MemoryStore, PgStore, UserStore};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use tracing::{info, warn};

/// Applies `./migrations`. A failure stops startup.
async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Shared handles for request handlers. Built once in [`AppState::init`];
/// nothing else constructs stores.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub courses: Arc<dyn CourseStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let passwords = PasswordPolicy::new(config.password)?;

        match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let db = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                run_migrations(&db).await?;

                let store = Arc::new(PgStore::new(db, passwords));
                Ok(Self::from_parts(store.clone(), store, config))
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on exit");
                let store = Arc::new(MemoryStore::new(passwords));
                Ok(Self::from_parts(store.clone(), store, config))
            }
        }
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        courses: Arc<dyn CourseStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            courses,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::PasswordConfig;

        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            store: StoreBackend::Memory,
            host: "127.0.0.1".into(),
            port: 0,
            password: PasswordConfig {
                work_factor: 10,
                memory_kib: 64,
            },
        });
        let store = Arc::new(MemoryStore::new(crate::auth::password::test_policy()));
        Self::from_parts(store.clone(), store, config)
    }
}
