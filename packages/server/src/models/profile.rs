use serde::Deserialize;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    /// The password currently set on the account.
    pub current_password: String,
    /// The new password, at least 8 characters.
    #[schema(min_length = 8)]
    pub password: String,
    /// Must repeat `password` exactly.
    pub password_confirmation: String,
}
