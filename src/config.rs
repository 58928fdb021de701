use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub hashing: HashingConfig,
    /// Accounts promoted to administrator at startup.
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: signing_secret(std::env::var("JWT_SECRET")?)?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gymdesk".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gymdesk-users".into()),
            ttl_days: env_parse("JWT_TTL_DAYS").unwrap_or(30),
        };
        let cookie = CookieConfig {
            name: std::env::var("COOKIE_NAME").unwrap_or_else(|_| "jwt".into()),
            secure: std::env::var("APP_ENV")
                .map(|v| v != "development")
                .unwrap_or(true),
        };
        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_parse("ARGON2_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: env_parse("ARGON2_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: env_parse("ARGON2_PARALLELISM").unwrap_or(defaults.parallelism),
        };
        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|v| parse_email_list(&v))
            .unwrap_or_default();
        Ok(Self {
            database_url,
            jwt,
            cookie,
            hashing,
            admin_emails,
        })
    }
}

/// Rejects a blank HMAC key.
fn signing_secret(raw: String) -> anyhow::Result<String> {
    if raw.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }
    Ok(raw)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
