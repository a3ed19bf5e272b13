use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_bio")]
    pub bio: String,
}

fn default_bio() -> String {
    "Minimalist. Aurora User.".to_string()
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Clients post their full auth payload to both endpoints, so extra
/// fields (like `bio`) are tolerated here.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// A failed login serializes as exactly `{"success":false}` — a wrong
/// password and an unknown username are indistinguishable to the caller.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl LoginResponse {
    pub fn failure() -> Self {
        Self {
            success: false,
            username: None,
            bio: None,
        }
    }
}
