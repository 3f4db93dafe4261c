use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use tama_auth::Role;
use tama_core::DomainError;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user_name", &self.user_name)
            .finish_non_exhaustive()
    }
}

/// Body of `PUT /api/users/:id`.
///
/// `role` is subject to the field-level role restriction; `password` is
/// re-hashed before it reaches the store.
#[derive(Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub profil_picture: Option<String>,
    pub gaming_time: Option<i64>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl core::fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("name", &self.name)
            .field("last_name", &self.last_name)
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("profil_picture", &self.profil_picture)
            .field("gaming_time", &self.gaming_time)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// -------------------------
// Extraction helpers
// -------------------------

/// Unwrap a JSON body, answering malformed input in the common error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            rejection.body_text(),
        )),
    }
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(errors::domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use tama_core::UserId;

    use super::*;

    #[test]
    fn update_body_accepts_partial_fields() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"name":"Alicia","role":"super_admin"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Alicia"));
        assert_eq!(req.role, Some(Role::SuperAdmin));
        assert!(req.password.is_none());
    }

    #[test]
    fn passwords_stay_out_of_debug_output() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"password":"hunter22"}"#).unwrap();
        assert!(!format!("{req:?}").contains("hunter22"));

        let login: LoginRequest =
            serde_json::from_str(r#"{"user_name":"alice","password":"hunter22"}"#).unwrap();
        assert!(!format!("{login:?}").contains("hunter22"));
    }

    #[test]
    fn bad_path_ids_are_client_errors() {
        assert_eq!(parse_id::<UserId>("5").unwrap(), UserId::new(5));
        let res = parse_id::<UserId>("five").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
