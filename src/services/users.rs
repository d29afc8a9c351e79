use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::{models::profiles, repositories::profiles::ProfileRepository};

pub enum UserRequest {
    CreateUser {
        email: String,
        referral_code: Option<String>,
        response: oneshot::Sender<Result<profiles::Profile, ServiceError>>,
    },
    GetUser {
        id: String,
        response: oneshot::Sender<Result<Option<profiles::Profile>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: ProfileRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = ProfileRepository::new(sql_conn);

        UserRequestHandler { repository }
    }

    async fn create_user(
        &self,
        email: &str,
        referral_code: Option<String>,
    ) -> Result<profiles::Profile, ServiceError> {
        self.repository
            .insert_profile(email, referral_code)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_user(&self, id: &str) -> Result<Option<profiles::Profile>, ServiceError> {
        self.repository
            .get_profile_by_id(id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::CreateUser {
                email,
                referral_code,
                response,
            } => {
                let profile = self.create_user(&email, referral_code).await;
                let _ = response.send(profile);
            }
            UserRequest::GetUser { id, response } => {
                let profile = self.get_user(&id).await;
                let _ = response.send(profile);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
