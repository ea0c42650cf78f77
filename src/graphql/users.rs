use async_graphql::{Context, ErrorExtensions, Object, Result};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use super::types::{required, UserObject, MAX_TEXT_LEN};
use crate::auth::password::{generate_placeholder_password, hash_password};
use crate::display_id::{next_display_id, Role};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub role: String,
    pub tenant_id: String,
    pub password: Option<String>,
}

pub fn list_users(state: &AppState) -> AppResult<Vec<User>> {
    let mut conn = state.db()?;
    let rows = users::table
        .order((users::created_at.asc(), users::id.asc()))
        .load(&mut conn)?;
    Ok(rows)
}

pub fn create_user(state: &AppState, input: CreateUserInput) -> AppResult<User> {
    let email = required("email", &input.email, MAX_TEXT_LEN)?;
    if !email.contains('@') {
        return Err(AppError::bad_request("email must be a valid address"));
    }
    let tenant_id = required("tenantId", &input.tenant_id, MAX_TEXT_LEN)?;
    let role = input
        .role
        .parse::<Role>()
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let password = match input.password {
        Some(password) if password.is_empty() => {
            return Err(AppError::bad_request("password must not be empty"));
        }
        Some(password) => password,
        None => generate_placeholder_password(),
    };
    let password_hash = hash_password(&password)?;

    let mut conn = state.db()?;
    let created = conn.transaction::<User, DieselError, _>(|conn| {
        let display_id = next_display_id(conn, role)?;
        let new_user = NewUser {
            id: Uuid::new_v4(),
            email: email.clone(),
            role: role.as_str().to_string(),
            tenant_id,
            display_id,
            password_hash,
        };
        diesel::insert_into(users::table)
            .values(&new_user)
            .get_result(conn)
    });

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %role, display_id = %user.display_id, "created user");
            Ok(user)
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
            AppError::bad_request(format!("a user with email {email} already exists")),
        ),
        Err(err) => Err(AppError::from(err)),
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let state = ctx.data::<AppState>()?;
        let rows = list_users(state).map_err(|err| err.extend())?;
        Ok(rows.into_iter().map(UserObject::from).collect())
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        email: String,
        role: String,
        tenant_id: String,
        password: Option<String>,
    ) -> Result<UserObject> {
        let state = ctx.data::<AppState>()?;
        let input = CreateUserInput {
            email,
            role,
            tenant_id,
            password,
        };
        let user = create_user(state, input).map_err(|err| err.extend())?;
        Ok(user.into())
    }
}
