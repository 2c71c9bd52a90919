use crate::{
    auth::{AuthService, AuthUser, Role, TokenSubject},
    entities::{admin, sub_admin},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

const INCORRECT_PHONE: &str = "Incorrect phone number";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubAdminInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffLoginInput {
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSession<T> {
    pub token: String,
    pub is_admin: bool,
    pub admin: T,
}

/// Admin and sub-admin accounts
#[derive(Clone)]
pub struct StaffService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl StaffService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Creates an admin. The very first admin may be created anonymously;
    /// after that a staff caller is required.
    #[instrument(skip(self, caller, input), fields(phone = %input.phone))]
    pub async fn create_admin(
        &self,
        caller: Option<&AuthUser>,
        input: AdminInput,
    ) -> Result<admin::Model, ServiceError> {
        let staff_caller = caller.is_some_and(AuthUser::is_staff);
        if !staff_caller {
            let admins = admin::Entity::find().count(&*self.db).await?;
            if admins > 0 || caller.is_some() {
                return Err(ServiceError::Forbidden("Forbidden - Staff access required".into()));
            }
        }

        let existing = admin::Entity::find()
            .filter(admin::Column::Phone.eq(input.phone.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(phone_taken());
        }

        let now = Utc::now();
        let admin = admin::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, phone_taken()))?;

        info!(admin_id = admin.id, "admin created");
        Ok(admin)
    }

    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn admin_login(&self, input: StaffLoginInput) -> Result<StaffSession<admin::Model>, ServiceError> {
        let admin = admin::Entity::find()
            .filter(admin::Column::Phone.eq(input.phone.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(INCORRECT_PHONE.into()))?;

        let token = self.auth.issue_access_token(&TokenSubject {
            id: admin.id,
            name: admin.name.clone(),
            phone: admin.phone.clone(),
            email: None,
            role: Role::Admin,
        })?;
        Ok(StaffSession {
            token,
            is_admin: true,
            admin,
        })
    }

    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn create_sub_admin(&self, input: SubAdminInput) -> Result<sub_admin::Model, ServiceError> {
        let email = input.email.trim().to_lowercase();
        let by_phone = sub_admin::Entity::find()
            .filter(sub_admin::Column::Phone.eq(input.phone.as_str()))
            .one(&*self.db)
            .await?;
        if by_phone.is_some() {
            return Err(phone_taken());
        }
        let by_email = sub_admin::Entity::find()
            .filter(sub_admin::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        if by_email.is_some() {
            return Err(ServiceError::BadRequest("Email already exists".into()));
        }

        let now = Utc::now();
        let sub_admin = sub_admin::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(email),
            role: Set(input.role.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, phone_taken()))?;

        info!(sub_admin_id = sub_admin.id, "sub-admin created");
        Ok(sub_admin)
    }

    #[instrument(skip(self))]
    pub async fn list_sub_admins(&self) -> Result<Vec<sub_admin::Model>, ServiceError> {
        Ok(sub_admin::Entity::find()
            .order_by_desc(sub_admin::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_sub_admin(&self, id: i32) -> Result<(), ServiceError> {
        let result = sub_admin::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Sub-admin not found".into()));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn sub_admin_login(
        &self,
        input: StaffLoginInput,
    ) -> Result<StaffSession<sub_admin::Model>, ServiceError> {
        let sub_admin = sub_admin::Entity::find()
            .filter(sub_admin::Column::Phone.eq(input.phone.as_str()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(INCORRECT_PHONE.into()))?;

        let token = self.auth.issue_access_token(&TokenSubject {
            id: sub_admin.id,
            name: sub_admin.name.clone(),
            phone: sub_admin.phone.clone(),
            email: Some(sub_admin.email.clone()),
            role: Role::SubAdmin,
        })?;
        Ok(StaffSession {
            token,
            is_admin: false,
            admin: sub_admin,
        })
    }
}

fn phone_taken() -> ServiceError {
    ServiceError::BadRequest("Phone number already exists".into())
}
