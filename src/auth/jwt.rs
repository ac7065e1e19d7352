use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, Role, TokenKind};
use crate::{config::JwtConfig, state::AppState};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs((m.max(0) as u64) * 60)
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: minutes(ttl_minutes),
            refresh_ttl: minutes(refresh_ttl_minutes),
            reset_ttl: minutes(reset_ttl_minutes),
        }
    }
}

impl JwtKeys {
    fn sign_with(
        &self,
        sub: Uuid,
        kind: TokenKind,
        role: Role,
        pwd: Option<String>,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Reset => self.reset_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            role,
            pwd,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(sub = %sub, kind = ?kind, role = ?role, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with(user_id, TokenKind::Access, Role::User, None)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with(user_id, TokenKind::Refresh, Role::User, None)
    }

    /// Reset tokens carry the fingerprint of the password they replace.
    pub fn sign_reset(&self, user_id: Uuid, fingerprint: &str) -> anyhow::Result<String> {
        self.sign_with(user_id, TokenKind::Reset, Role::User, Some(fingerprint.to_owned()))
    }

    pub fn sign_admin(&self) -> anyhow::Result<String> {
        self.sign_with(Uuid::nil(), TokenKind::Access, Role::Admin, None)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(sub = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    fn verify_kind(&self, token: &str, kind: TokenKind) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            anyhow::bail!("not a {:?} token", kind);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_kind(token, TokenKind::Refresh)
    }

    pub fn verify_reset(&self, token: &str) -> anyhow::Result<Claims> {
        self.verify_kind(token, TokenKind::Reset)
    }
}
