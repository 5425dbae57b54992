// handlers/auth.rs
use axum::{
    extract::State,
    response::Json,
    Extension,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::doc;
use mongodb::Collection;
use validator::Validate;

use crate::dtos::auth_dtos::{LoginRequest, SignupRequest};
use crate::errors::{AppError, Result};
use crate::models::user::{AuthResponse, Claims, User, UserResponse, UserRole};
use crate::state::AppState;

const TOKEN_LIFETIME_SECS: i64 = 15 * 24 * 60 * 60;

fn generate_token(user: &User, jwt_secret: &str) -> Result<String> {
    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now().timestamp() + TOKEN_LIFETIME_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|_| AppError::AuthError)
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    if payload.password != payload.confirm_password {
        return Err(AppError::invalid_data("Passwords do not match"));
    }

    let role = match payload.role.as_deref() {
        None | Some("undergraduate") => UserRole::Undergraduate,
        Some("graduate") => UserRole::Graduate,
        Some("instructor") => UserRole::Instructor,
        Some(other) => {
            return Err(AppError::invalid_data(format!("Unknown role '{}'", other)));
        }
    };

    let collection: Collection<User> = state.db.collection("users");

    // Check if user exists by username or email
    let filter = doc! {
        "$or": [
            { "username": &payload.username },
            { "email": &payload.email }
        ]
    };

    if collection.find_one(filter).await?.is_some() {
        return Err(AppError::invalid_data("User already exists"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::Backend)?;

    let now = Utc::now();
    let mut user = User {
        id: None,
        username: payload.username.clone(),
        email: payload.email.to_lowercase(),
        password_hash,
        role,
        created_at: now,
        updated_at: now,
    };

    let insert_result = collection.insert_one(&user).await?;
    user.id = insert_result.inserted_id.as_object_id();

    let token = generate_token(&user, &state.jwt_secret)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from_user(&user),
        token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection("users");

    let filter = doc! { "email": payload.email.to_lowercase() };
    let user = collection.find_one(filter).await?.ok_or(AppError::AuthError)?;

    let valid = verify(&payload.password, &user.password_hash)
        .map_err(|_| AppError::AuthError)?;

    if !valid {
        return Err(AppError::AuthError);
    }

    let token = generate_token(&user, &state.jwt_secret)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from_user(&user),
        token,
    }))
}

/// `GET /me` behind the auth middleware; answers from the verified token
/// plus a fresh profile read.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>> {
    let collection: Collection<User> = state.db.collection("users");

    let object_id = mongodb::bson::oid::ObjectId::parse_str(&claims.sub)?;
    let user = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::AuthError)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from_user(&user),
    })))
}
