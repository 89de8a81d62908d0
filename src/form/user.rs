use serde::{Deserialize, Serialize};

use crate::domain::user::User;

#[derive(Deserialize, Default, Debug)]
pub struct RegisterFormData {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default, Debug)]
pub struct SignInFormData {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    pub form: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Deserialize, Debug)]
pub struct GetUserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub picture: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            fullname: user.username,
            email: user.email,
            picture: user.picture,
        }
    }
}
