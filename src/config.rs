/// Argon2 cost settings applied to every stored password.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub work_factor: u32,
    pub memory_kib: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            work_factor: 10,
            memory_kib: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub store: StoreBackend,
    pub host: String,
    pub port: u16,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND `{other}` (expected postgres or memory)"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            work_factor: env_parse("PASSWORD_WORK_FACTOR").unwrap_or(defaults.work_factor),
            memory_kib: env_parse("PASSWORD_MEMORY_KIB").unwrap_or(defaults.memory_kib),
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            store,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(8080),
            password,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
