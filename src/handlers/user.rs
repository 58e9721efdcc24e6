use bcrypt::{hash, verify, DEFAULT_COST};
use crate::dtos::user::{RegisterUserRequest, RegisterResponse, UserResponse, LoginRequest, LoginResponse};
use crate::auth::jwt::{sign_token, TOKEN_LIFETIME_SECONDS};
use crate::error::AppError;
use axum::{extract::State, Json};
use crate::state::AppState;
use crate::models::user::User;
use crate::middleware::auth::AuthContext;
use axum::extract::Extension;

const SELECT_USER: &str =
    "SELECT id, phone_number, email, first_name, last_name, is_active, created_at FROM users";

pub async fn register_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(axum::http::StatusCode, Json<RegisterResponse>), AppError> {
    // Basic validation
    if payload.phone_number.trim().is_empty() {
        return Err(AppError::validation("Phone number required"));
    }
    if payload.password.len() < 6 {
        return Err(AppError::validation("Password too short"));
    }
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(AppError::validation("Invalid email address"));
        }
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    // User and profile land together or not at all
    let mut tx = db_pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (phone_number, email, password_hash, first_name, last_name)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, phone_number, email, first_name, last_name, is_active, created_at",
    )
    .bind(payload.phone_number.trim())
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.first_name.as_deref().unwrap_or(""))
    .bind(payload.last_name.as_deref().unwrap_or(""))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::conflict("Phone number or email already registered");
            }
        }
        AppError::db(e)
    })?;

    if let Some(profile) = &payload.profile {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, title, date_of_birth, address, country, city, zip)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&profile.title)
        .bind(profile.date_of_birth)
        .bind(&profile.address)
        .bind(&profile.country)
        .bind(&profile.city)
        .bind(&profile.zip)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::internal("JWT secret not configured"))?;
    let access = sign_token(user.id, &user.phone_number, &secret)?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully.",
            access,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    // Login works with either the phone number or the email on file.
    let row = match (&payload.phone_number, &payload.email) {
        (Some(phone), _) => {
            sqlx::query_as::<_, LoginRow>(
                "SELECT id, phone_number, password_hash, is_active FROM users WHERE phone_number = $1",
            )
            .bind(phone)
            .fetch_optional(&db_pool)
            .await?
        }
        (None, Some(email)) => {
            sqlx::query_as::<_, LoginRow>(
                "SELECT id, phone_number, password_hash, is_active FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&db_pool)
            .await?
        }
        (None, None) => {
            return Err(AppError::validation("Provide either email or phone number"));
        }
    };

    let user = row.ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::internal("JWT secret not configured"))?;

    let token = sign_token(user.id, &user.phone_number, &secret)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: TOKEN_LIFETIME_SECONDS,
    }))
}

// Authenticated endpoint: returns the stored user row for the token's id
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
        .bind(auth.user_id)
        .fetch_optional(&db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(user)))
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: i64,
    phone_number: String,
    password_hash: String,
    is_active: bool,
}
