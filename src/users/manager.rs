//! Account operations: registration, login, profile and password changes

use super::models::*;
use super::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::auth::jwt::issue_token;
use crate::error::{ServiceError, ServiceResult};
use crate::store::ContentStore;
use crate::AuthConfig;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Manager for user accounts
pub struct UserManager {
    store: Arc<dyn ContentStore>,
    auth: Option<AuthConfig>,
}

/// Minimal shape check: `local@domain.tld`
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn check_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl UserManager {
    pub fn new(store: Arc<dyn ContentStore>, auth: Option<AuthConfig>) -> Self {
        Self { store, auth }
    }

    fn auth(&self) -> ServiceResult<&AuthConfig> {
        self.auth.as_ref().ok_or_else(|| {
            ServiceError::Forbidden("Authentication not configured".to_string())
        })
    }

    fn bcrypt_cost(&self) -> u32 {
        self.auth
            .as_ref()
            .map(|a| a.bcrypt_cost)
            .unwrap_or(super::password::DEFAULT_BCRYPT_COST)
    }

    fn issue_session(&self, user: &User) -> ServiceResult<AuthSession> {
        let token = issue_token(user, self.auth()?)?;
        Ok(AuthSession {
            token,
            user: user.profile(),
        })
    }

    /// Self-service registration. New accounts are always viewers.
    pub async fn register(&self, req: RegisterRequest) -> ServiceResult<AuthSession> {
        if !self.auth()?.allow_registration {
            return Err(ServiceError::Forbidden(
                "Registration is disabled".to_string(),
            ));
        }

        let user = self
            .create_user(&req.name, &req.email, &req.password, Role::Viewer)
            .await?;
        self.issue_session(&user)
    }

    /// Create an account with any role (used by the CLI).
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> ServiceResult<User> {
        if name.trim().is_empty() {
            return Err(ServiceError::validation("Please provide a name"));
        }
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ServiceError::validation("Please provide a valid email"));
        }
        check_password(password)?;

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict("User with this email already exists"));
        }

        let hash = hash_password(password, self.bcrypt_cost())?;
        let user = User::new(name, &email, hash, role);
        self.store.create_user(&user).await?;

        info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    /// Exchange credentials for a token. Unknown email and wrong password
    /// produce the same error.
    pub async fn login(&self, req: LoginRequest) -> ServiceResult<AuthSession> {
        self.auth()?;
        let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());

        let email = normalize_email(&req.email);
        let mut user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&req.password, &user.password_hash) {
            warn!(user_id = %user.id, "Failed login");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(ServiceError::Forbidden(
                "User account is deactivated".to_string(),
            ));
        }

        user.last_login = Some(Utc::now());
        self.store.update_user(&user).await?;

        info!(user_id = %user.id, "User logged in");
        self.issue_session(&user)
    }

    pub async fn profile(&self, user_id: Uuid) -> ServiceResult<UserProfile> {
        Ok(self.find(user_id).await?.profile())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> ServiceResult<UserProfile> {
        let mut user = self.find(user_id).await?;

        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(ServiceError::validation("Name cannot be empty"));
            }
            user.name = name.trim().to_string();
        }

        if let Some(email) = req.email {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(ServiceError::validation("Please provide a valid email"));
            }
            if email != user.email {
                if let Some(other) = self.store.get_user_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(ServiceError::conflict("Email is already in use"));
                    }
                }
                user.email = email;
            }
        }

        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        Ok(user.profile())
    }

    /// Verify the current password, then store a single fresh hash.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        let mut user = self.find(user_id).await?;

        if !verify_password(&req.current_password, &user.password_hash) {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        check_password(&req.new_password)?;

        user.password_hash = hash_password(&req.new_password, self.bcrypt_cost())?;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> ServiceResult<User> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }
}
