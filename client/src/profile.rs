//! Profile bootstrap run right after sign-in

use reqwest::StatusCode;
use shared::{generate_custom_id, CreateProfileRequest, UserProfile};

use crate::api::ApiClient;
use crate::error::{ClientError, ClientResult};

const PROFILE_PATH: &str = "/api/users/profile";

/// Custom IDs tried before giving up on collisions
const CREATE_ATTEMPTS: usize = 5;

impl ApiClient {
    /// Fetch the caller's profile, creating it with a fresh custom ID when
    /// missing. The whole flow is bounded by the profile timeout.
    pub async fn get_or_create_profile(&self) -> ClientResult<UserProfile> {
        tokio::time::timeout(self.profile_timeout, self.fetch_or_create_profile())
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.profile_timeout, "Profile bootstrap timed out");
                ClientError::Timeout
            })?
    }

    async fn fetch_or_create_profile(&self) -> ClientResult<UserProfile> {
        match self.get::<UserProfile>(PROFILE_PATH).await {
            Err(err) if err.is_not_found() => self.create_profile().await,
            result => result,
        }
    }

    async fn create_profile(&self) -> ClientResult<UserProfile> {
        let mut attempt = 1;
        loop {
            let request = CreateProfileRequest {
                custom_id: Some(generate_custom_id()),
                display_name: None,
            };

            // The server returns the existing row if another tab won the race
            match self.post(PROFILE_PATH, &request).await {
                Err(ClientError::Api { status, .. })
                    if status == StatusCode::CONFLICT && attempt < CREATE_ATTEMPTS =>
                {
                    tracing::debug!(attempt, "Custom ID taken, generating another");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
