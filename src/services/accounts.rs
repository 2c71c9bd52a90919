use crate::{
    auth::{
        password::{hash_password, verify_password},
        AuthService, Role, TokenSubject,
    },
    entities::user,
    errors::ServiceError,
    services::commerce::subscription_service,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

const INVALID_LOGIN: &str = "Invalid phone number or password";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// A user with a freshly issued token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: user::Model,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: user::Model,
    pub is_premium: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

/// Reader accounts: signup, login, password reset and staff lookups.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn signup(&self, input: SignupInput) -> Result<Session, ServiceError> {
        let email = input.email.trim().to_lowercase();
        if self.find_by_phone(&input.phone).await?.is_some() {
            return Err(ServiceError::Unauthorized("Phone number already exist".into()));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Unauthorized("Email already exist".into()));
        }

        let now = Utc::now();
        let user = user::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(email),
            status: Set(true),
            password_hash: Set(hash_password(&input.password)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            ServiceError::on_unique_violation(e, ServiceError::Unauthorized("Phone number already exist".into()))
        })?;

        info!(user_id = user.id, "user signed up");
        self.session(user)
    }

    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn login(&self, input: LoginInput) -> Result<Session, ServiceError> {
        let user = user::Entity::find()
            .filter(user::Column::Phone.eq(input.phone.as_str()))
            .filter(user::Column::Status.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_LOGIN.into()))?;

        if !verify_password(&input.password, &user.password_hash)? {
            warn!(user_id = user.id, "login rejected");
            return Err(ServiceError::Unauthorized(INVALID_LOGIN.into()));
        }
        self.session(user)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".into()))
    }

    /// Issues a short-lived reset token for the user matching `query` by phone, then email.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, query: &str) -> Result<Session, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::BadRequest("Phone or email is required".into()));
        }
        let user = match self.find_by_phone(query).await? {
            Some(user) => user,
            None => self
                .find_by_email(&query.to_lowercase())
                .await?
                .ok_or_else(|| ServiceError::NotFound("User not found".into()))?,
        };
        let token = self.auth.issue_reset_token(&subject(&user))?;
        Ok(Session { token, user })
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, input: ChangePasswordInput) -> Result<(), ServiceError> {
        let claims = self.auth.validate_reset_token(&input.token)?;
        let id: i32 = claims
            .sub
            .parse()
            .map_err(|_| ServiceError::Forbidden("Forbidden - Invalid token".into()))?;
        let user = self.profile(id).await?;

        let mut model: user::ActiveModel = user.into();
        model.password_hash = Set(hash_password(&input.password)?);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;

        info!(user_id = id, "password changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: u64, limit: u64) -> Result<UserPage, ServiceError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let paginator = user::Entity::find()
            .order_by_desc(user::Column::Id)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        let mut users = Vec::with_capacity(rows.len());
        for user in rows {
            let is_premium = subscription_service::is_premium(&*self.db, user.id).await?;
            users.push(UserSummary { user, is_premium });
        }

        Ok(UserPage {
            users,
            total_count: total,
            total_pages: total.div_ceil(limit),
            current_page: page,
            limit,
        })
    }

    /// Soft delete: the account stays but can no longer log in.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i32) -> Result<(), ServiceError> {
        let user = self.profile(id).await?;
        let mut model: user::ActiveModel = user.into();
        model.status = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    fn session(&self, user: user::Model) -> Result<Session, ServiceError> {
        let token = self.auth.issue_access_token(&subject(&user))?;
        Ok(Session { token, user })
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Phone.eq(phone))
            .one(&*self.db)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }
}

fn subject(user: &user::Model) -> TokenSubject {
    TokenSubject {
        id: user.id,
        name: user.name.clone(),
        phone: user.phone.clone(),
        email: Some(user.email.clone()),
        role: Role::User,
    }
}
