use crate::auth::{jwt::JwtKeys, password::Passwords};
use crate::config::AppConfig;
use crate::users::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub passwords: Passwords,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; accounts live in memory and vanish on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Self::from_parts(users, config)
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt);
        let passwords = Passwords::new(&config.hashing)?;
        Ok(Self {
            users,
            config,
            keys,
            passwords,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_days: 30,
            },
            cookie: crate::config::CookieConfig {
                name: "jwt".into(),
                secure: false,
            },
            hashing: crate::auth::password::fast_config(),
            admin_emails: Vec::new(),
        });
        let users = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(users, config).expect("fake state")
    }
}
