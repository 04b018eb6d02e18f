use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for name: {}", req.name);
    match state.auth.register(&req.name, &req.password).await {
        Ok(pair) => {
            info!("Registration successful for name: {}", req.name);
            Ok(HttpResponse::Created().json(pair))
        }
        Err(e) => {
            error!("Registration failed for name: {}: {}", req.name, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for name: {}", req.name);
    match state.auth.login(&req.name, &req.password).await {
        Ok(pair) => {
            info!("Login successful for name: {}", req.name);
            Ok(HttpResponse::Ok().json(pair))
        }
        Err(e) => {
            error!("Login failed for name: {}: {}", req.name, e);
            Err(e)
        }
    }
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let access_token = state.auth.refresh(&req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

pub async fn logout(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth.logout(&req.refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Returns the user the presented access token belongs to.
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req)?;
    let user = state.auth.current_user(token).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.auth.get_user(&path).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: String,
}

pub async fn edit_user(
    path: web::Path<String>,
    req: web::Json<EditUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.auth.edit_user(&path, &req.name).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    state.auth.delete_user(&id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("User with id {} successfully deleted", id)
    })))
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("No authorization token provided".into()))
}
