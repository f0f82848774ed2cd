//! Application users.
//!
//! Passwords are stored exactly as given; callers hash them first.

use std::sync::Arc;

use backpack_orm::{
    EntityType, Executor, Field, Filter, Generator, LogicalType, Record, Repository, Result,
    Value,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;

/// How long an issued verification token stays valid.
pub const TOKEN_LIFETIME_MINUTES: i64 = 5;

pub fn entity() -> Result<Arc<EntityType>> {
    EntityType::builder("User")
        .table("User")
        .field(
            "id",
            Field::new(LogicalType::text())
                .column("userId")
                .primary_key()
                .generated(Generator::Uuid),
        )
        .field(
            "username",
            Field::new(LogicalType::varchar(25)).required().unique(),
        )
        .field(
            "email",
            Field::new(LogicalType::varchar(50)).required().unique(),
        )
        .field("password", Field::new(LogicalType::text()).required())
        .field(
            "birth_date",
            Field::new(LogicalType::Date).column("birthDate").required(),
        )
        .field(
            "verification_token",
            Field::new(LogicalType::text()).column("verificationToken"),
        )
        .field(
            "token_sent_at",
            Field::new(LogicalType::DateTime)
                .column("tokenSentAt")
                .required()
                .default_now(),
        )
        .field(
            "verified",
            Field::new(LogicalType::Boolean).required().default(false),
        )
        .field(
            "created_at",
            Field::new(LogicalType::DateTime)
                .column("createdAt")
                .required()
                .default_now(),
        )
        .field(
            "updated_at",
            Field::new(LogicalType::DateTime)
                .column("updatedAt")
                .required()
                .default_now(),
        )
        .build()
}

/// Input for [`register`].
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub birth_date: NaiveDate,
}

/// Build an unsaved user from already-hashed credentials, creating the
/// `User` table if needed.
pub fn new_user<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    entity: &Arc<EntityType>,
    input: &NewUser<'_>,
) -> Result<Record> {
    repo.create(
        entity,
        [
            ("username", Value::from(input.username)),
            ("email", Value::from(input.email)),
            ("password", Value::from(input.password_hash)),
            ("birth_date", Value::from(input.birth_date)),
        ],
    )
}

/// Issue a fresh verification token and stamp when it was sent.
pub fn issue_verification_token(user: &mut Record) -> Result<String> {
    let token = uuid::Uuid::new_v4().simple().to_string();
    user.set("verification_token", token.as_str())?;
    user.set("token_sent_at", Utc::now().naive_utc())?;
    Ok(token)
}

/// Insert a new user with a pending verification token.
pub fn register<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    entity: &Arc<EntityType>,
    input: &NewUser<'_>,
) -> Result<Record> {
    let mut user = new_user(repo, entity, input)?;
    issue_verification_token(&mut user)?;
    repo.insert(&mut user)?;
    tracing::info!(username = input.username, "registered user");
    Ok(user)
}

/// Look a user up by username, falling back to email.
pub fn find_by_login<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    entity: &Arc<EntityType>,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<Option<Record>> {
    let filter = match (username, email) {
        (Some(username), _) => Filter::by("username", username),
        (None, Some(email)) => Filter::by("email", email),
        (None, None) => return Ok(None),
    };
    repo.find_one(entity, &filter)
}

/// Whether the user's token was sent more than [`TOKEN_LIFETIME_MINUTES`] ago.
/// A user with no send time counts as expired.
pub fn token_expired(user: &Record) -> Result<bool> {
    let Some(sent_at) = user.get("token_sent_at")?.as_datetime() else {
        return Ok(true);
    };
    Ok(Utc::now().naive_utc() - sent_at > Duration::minutes(TOKEN_LIFETIME_MINUTES))
}

/// Mark the user verified if `token` matches the one issued and has not
/// expired.
///
/// Returns `false` without touching storage on a mismatch or an expired token.
pub fn verify<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    user: &mut Record,
    token: &str,
) -> Result<bool> {
    if user.get("verification_token")?.as_str() != Some(token) {
        return Ok(false);
    }
    if token_expired(user)? {
        tracing::debug!(user = %user.id(), "verification token expired");
        return Ok(false);
    }

    user.set("verified", true)?;
    user.set("verification_token", Value::Null)?;
    user.set("updated_at", Utc::now().naive_utc())?;
    repo.update(user)?;
    Ok(true)
}

/// Fields safe to hand back to clients.
pub fn public_json(user: &Record) -> Result<serde_json::Value> {
    Ok(json!({
        "userId": user.get("id")?,
        "username": user.get("username")?,
        "email": user.get("email")?,
        "birthDate": user.get("birth_date")?,
        "verified": user.get("verified")?,
        "createdAt": user.get("created_at")?,
    }))
}
