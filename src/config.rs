use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

/// Credentials of the single console operator.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_minutes(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "prepbank"),
            audience: env_or("JWT_AUDIENCE", "prepbank-users"),
            ttl_minutes: env_minutes("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_minutes("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
            reset_ttl_minutes: env_minutes("RESET_TTL_MINUTES", 30),
        };
        let admin = AdminConfig {
            username: std::env::var("ADMIN_USERNAME").context("ADMIN_USERNAME is not set")?,
            password: std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?,
        };
        let storage = StorageConfig {
            endpoint: env_or("MINIO_ENDPOINT", "http://localhost:9000"),
            bucket: env_or("MINIO_BUCKET", "prepbank"),
            access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            region: env_or("MINIO_REGION", "us-east-1"),
        };
        Ok(Self {
            database_url,
            public_url: env_or("APP_PUBLIC_URL", "http://localhost:5173"),
            jwt,
            admin,
            storage,
        })
    }
}
