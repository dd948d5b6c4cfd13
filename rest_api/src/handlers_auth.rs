// rest_api/src/handlers_auth.rs

//! Registration, login, and token introspection.

use axum::Json;
use axum::extract::State;
use models::ApiResult;
use models::nurse::{LoginRequest, NewNurse, NurseProfile};
use security::AuthNurse;
use serde::Serialize;

use crate::{AppState, Payload};

/// Issued on both registration and login: the bearer token plus the profile
/// of the nurse it belongs to.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub nurse: NurseProfile,
}

pub async fn register(
    State(state): State<AppState>,
    Payload(new): Payload<NewNurse>,
) -> ApiResult<Json<TokenResponse>> {
    let (token, nurse) = state.auth.register(&state.store, new).await?;
    Ok(Json(TokenResponse {
        token,
        nurse: nurse.profile(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let (token, nurse) = state.auth.login(&state.store, request).await?;
    Ok(Json(TokenResponse {
        token,
        nurse: nurse.profile(),
    }))
}

pub async fn me(AuthNurse(nurse): AuthNurse) -> Json<NurseProfile> {
    Json(nurse.profile())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{get, post_json, register, send, test_app};

    #[tokio::test]
    async fn register_returns_token_and_clean_profile() {
        let app = test_app();
        let (token, nurse) = register(&app, "dana@clinic.example").await;
        assert!(!token.is_empty());
        assert_eq!(nurse["email"], "dana@clinic.example");
        assert_eq!(nurse["is_admin"], true);
        assert!(nurse.get("password_hash").is_none());
        assert!(nurse.get("password").is_none());
    }

    #[tokio::test]
    async fn second_registration_is_not_admin() {
        let app = test_app();
        register(&app, "first@clinic.example").await;
        let (_, nurse) = register(&app, "second@clinic.example").await;
        assert_eq!(nurse["is_admin"], false);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_with_400() {
        let app = test_app();
        register(&app, "dana@clinic.example").await;
        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                None,
                json!({
                    "email": "dana@clinic.example",
                    "password": "another-password",
                    "full_name": "Someone Else",
                    "title": "LPN",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already registered");
    }

    #[tokio::test]
    async fn invalid_email_is_422() {
        let app = test_app();
        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                None,
                json!({
                    "email": "not-an-address",
                    "password": "long-enough-password",
                    "full_name": "Dana Fields",
                    "title": "RN",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn login_round_trips_and_me_resolves() {
        let app = test_app();
        register(&app, "dana@clinic.example").await;
        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/login",
                None,
                json!({ "email": "dana@clinic.example", "password": "long-enough-password" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();

        let (status, me) = send(&app, get("/api/auth/me", Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "dana@clinic.example");
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_read_the_same() {
        let app = test_app();
        register(&app, "dana@clinic.example").await;
        let wrong = send(
            &app,
            post_json(
                "/api/auth/login",
                None,
                json!({ "email": "dana@clinic.example", "password": "wrong-password" }),
            ),
        )
        .await;
        let unknown = send(
            &app,
            post_json(
                "/api/auth/login",
                None,
                json!({ "email": "ghost@clinic.example", "password": "long-enough-password" }),
            ),
        )
        .await;
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.1["message"], unknown.1["message"]);
        assert_eq!(wrong.1["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_uniformly() {
        let app = test_app();
        let (status, body) = send(&app, get("/api/auth/me", Some("not-a-jwt"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");
    }
}
