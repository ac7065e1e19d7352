use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, Rng};
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::{
    claims::Claims,
    dto::SignupRequest,
    repo_types::{NewUser, User},
};
use crate::error::{unique_violation, AppError, AppResult};
use crate::ids::insert_with_fresh_id;

pub const BLOCKED_MESSAGE: &str = "Your account has been temporarily blocked due to activities \
     that violate our website's terms and conditions.";

pub const MIN_PASSWORD_LEN: usize = 8;
const USER_CODE_LEN: usize = 9;
const USER_CODE_ATTEMPTS: usize = 10;
const USER_CODE_CONSTRAINT: &str = "users_user_code_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";
const FINGERPRINT_LEN: usize = 16;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

fn check_password_length(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Password + confirmation checks for a reset.
pub fn validate_new_password(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::bad_request("Password does not match"));
    }
    check_password_length(password)
}

/// Normalizes the signup form in place and rejects it when incomplete.
///
/// Checks run in order: empty fields, email, confirmation, terms, length.
pub fn validate_signup(req: &mut SignupRequest) -> AppResult<()> {
    req.full_name = req.full_name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.mobile_number = req.mobile_number.trim().to_string();
    req.exam_type = req.exam_type.trim().to_string();

    if req.full_name.is_empty()
        || req.email.is_empty()
        || req.mobile_number.is_empty()
        || req.password.is_empty()
        || req.confirm_password.is_empty()
    {
        return Err(AppError::bad_request("Please fill all fields"));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    if req.password != req.confirm_password {
        return Err(AppError::bad_request("Password does not match"));
    }
    if !req.agree_to_terms {
        return Err(AppError::bad_request(
            "Please accept the terms and conditions",
        ));
    }
    check_password_length(&req.password)?;
    if req.exam_type.is_empty() {
        req.exam_type = "PO (SBI, IBPS, RRB)".into();
    }
    Ok(())
}

pub fn generate_user_code<R: Rng>(rng: &mut R) -> String {
    (0..USER_CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Inserts the account, drawing a new user code whenever one is taken.
/// An email claimed by a concurrent signup is a conflict.
pub async fn create_user(db: &PgPool, form: &SignupRequest, password_hash: &str) -> AppResult<User> {
    let (email, full_name, mobile_number, exam_preparing_for) = (
        form.email.as_str(),
        form.full_name.as_str(),
        form.mobile_number.as_str(),
        form.exam_type.as_str(),
    );
    insert_with_fresh_id(
        USER_CODE_ATTEMPTS,
        || generate_user_code(&mut rand::thread_rng()),
        move |user_code| async move {
            User::create(
                db,
                NewUser {
                    user_code: &user_code,
                    email,
                    password_hash,
                    full_name,
                    mobile_number,
                    exam_preparing_for,
                },
            )
            .await
        },
        |e| unique_violation(e) == Some(USER_CODE_CONSTRAINT),
    )
    .await
    .map_err(|e| {
        if unique_violation(&e) == Some(EMAIL_CONSTRAINT) {
            warn!(%email, "concurrent signup for the same email");
            AppError::Conflict("Email already registered".into())
        } else {
            e.into()
        }
    })
}

/// Short digest of the stored password hash. Reset tokens carry it, so a
/// token stops working once the password it was issued against changes.
pub fn password_fingerprint(password_hash: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(password_hash.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

pub fn reset_token_is_current(claims: &Claims, user: &User) -> bool {
    claims.sub == user.id
        && claims
            .pwd
            .as_deref()
            .is_some_and(|fp| constant_time_eq(fp, &password_fingerprint(&user.password_hash)))
}

/// Compares SHA-256 digests of both inputs in constant time, so neither the
/// content nor the length of the secret leaks through timing.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes())
        .as_slice()
        .ct_eq(Sha256::digest(b.as_bytes()).as_slice())
        .into()
}

/// Loads the user behind a token, refusing blocked accounts.
pub async fn ensure_active(db: &PgPool, user_id: Uuid) -> AppResult<User> {
    let user = User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    if user.is_blocked {
        warn!(%user_id, "blocked user rejected");
        return Err(AppError::Forbidden(BLOCKED_MESSAGE.into()));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn filled_form() -> SignupRequest {
        SignupRequest {
            full_name: "  Asha Rao ".into(),
            email: " Asha@Example.COM ".into(),
            mobile_number: "9876543210".into(),
            exam_type: "Clerk (SBI, IBPS, RRB)".into(),
            password: "sup3r-secret".into(),
            confirm_password: "sup3r-secret".into(),
            agree_to_terms: true,
        }
    }

    #[test]
    fn signup_normalizes_fields() {
        let mut form = filled_form();
        validate_signup(&mut form).expect("valid form");
        assert_eq!(form.email, "asha@example.com");
        assert_eq!(form.full_name, "Asha Rao");
    }

    #[test]
    fn signup_rejects_empty_fields() {
        let clears: [fn(&mut SignupRequest); 5] = [
            |f| f.full_name.clear(),
            |f| f.email = "   ".into(),
            |f| f.mobile_number.clear(),
            |f| f.password.clear(),
            |f| f.confirm_password.clear(),
        ];
        for clear in clears {
            let mut form = filled_form();
            clear(&mut form);
            let err = validate_signup(&mut form).unwrap_err();
            assert_eq!(err.to_string(), "Please fill all fields");
        }
    }

    #[test]
    fn signup_rejects_password_mismatch() {
        let mut form = filled_form();
        form.confirm_password = "something-else".into();
        let err = validate_signup(&mut form).unwrap_err();
        assert_eq!(err.to_string(), "Password does not match");
    }

    #[test]
    fn signup_requires_terms() {
        let mut form = filled_form();
        form.agree_to_terms = false;
        let err = validate_signup(&mut form).unwrap_err();
        assert!(err.to_string().contains("terms"));
    }

    #[test]
    fn signup_rejects_short_password_and_bad_email() {
        let mut form = filled_form();
        form.password = "short".into();
        form.confirm_password = "short".into();
        assert!(validate_signup(&mut form).is_err());

        let mut form = filled_form();
        form.email = "not-an-email".into();
        assert_eq!(validate_signup(&mut form).unwrap_err().to_string(), "Invalid email");
    }

    #[test]
    fn signup_checks_terms_before_password_length() {
        let mut form = filled_form();
        form.password = "short".into();
        form.confirm_password = "short".into();
        form.agree_to_terms = false;
        assert_eq!(
            validate_signup(&mut form).unwrap_err().to_string(),
            "Please accept the terms and conditions"
        );

        form.agree_to_terms = true;
        assert_eq!(
            validate_signup(&mut form).unwrap_err().to_string(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn signup_checks_mismatch_before_terms() {
        let mut form = filled_form();
        form.confirm_password = "different-secret".into();
        form.agree_to_terms = false;
        assert_eq!(
            validate_signup(&mut form).unwrap_err().to_string(),
            "Password does not match"
        );
    }

    #[test]
    fn signup_accepts_any_nonempty_mobile() {
        let mut form = filled_form();
        form.mobile_number = "98765".into();
        assert!(validate_signup(&mut form).is_ok());
    }

    fn user_with_hash(hash: &str) -> User {
        User {
            id: Uuid::new_v4(),
            user_code: "123456789".into(),
            email: "asha@example.com".into(),
            password_hash: hash.into(),
            full_name: "Asha Rao".into(),
            mobile_number: "9876543210".into(),
            exam_preparing_for: "PO".into(),
            is_blocked: false,
            last_sign_in_at: None,
            created_at: time::OffsetDateTime::now_utc(),
        }
    }

    fn reset_claims(sub: Uuid, pwd: Option<String>) -> Claims {
        Claims {
            sub,
            iat: 0,
            exp: 0,
            iss: "iss".into(),
            aud: "aud".into(),
            kind: crate::auth::claims::TokenKind::Reset,
            role: Default::default(),
            pwd,
        }
    }

    #[test]
    fn reset_token_is_spent_once_the_password_changes() {
        let mut user = user_with_hash("$argon2id$v=19$old");
        let claims = reset_claims(user.id, Some(password_fingerprint(&user.password_hash)));
        assert!(reset_token_is_current(&claims, &user));

        user.password_hash = "$argon2id$v=19$new".into();
        assert!(!reset_token_is_current(&claims, &user));
    }

    #[test]
    fn reset_token_needs_fingerprint_and_matching_subject() {
        let user = user_with_hash("$argon2id$v=19$old");
        assert!(!reset_token_is_current(&reset_claims(user.id, None), &user));

        let fp = Some(password_fingerprint(&user.password_hash));
        assert!(!reset_token_is_current(&reset_claims(Uuid::new_v4(), fp), &user));
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let fp = password_fingerprint("$argon2id$v=19$abc");
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, password_fingerprint("$argon2id$v=19$abc"));
        assert_ne!(fp, password_fingerprint("$argon2id$v=19$abd"));
        assert!(!fp.contains("argon2"));
    }

    #[test]
    fn constant_time_eq_compares_content_and_length() {
        assert!(constant_time_eq("admin-pass", "admin-pass"));
        assert!(!constant_time_eq("admin-pass", "admin-pasS"));
        assert!(!constant_time_eq("admin", "admin-pass"));
        assert!(!constant_time_eq("", "admin-pass"));
    }

    #[test]
    fn user_code_is_nine_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = generate_user_code(&mut rng);
            assert_eq!(code.len(), 9);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn password_hash_verifies_only_the_same_password() {
        let hash = hash_password("correct-horse-battery").expect("hash");
        assert!(verify_password("correct-horse-battery", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
        assert!(verify_password("anything", "not-a-valid-hash").is_err());
    }
}
