use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use tenderd_core::models::{Role, User, UserStatus};
use tenderd_core::AppError;

use crate::filter::{apply_filters, push_order_and_page, ListParams, USER_FIELDS};

/// Repository for users and their role sets. Roles live in `user_roles`
/// (one row per tag) and are loaded alongside every user.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        attach_roles_opt(&mut *conn, user).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?;
        attach_roles_opt(&mut *conn, user).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;
        attach_roles_opt(&mut *conn, user).await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a user with its role set in one transaction.
    #[tracing::instrument(skip(self, password_hash, roles), fields(db.table = "users", db.operation = "insert"))]
    pub async fn insert(
        &self,
        name: &str,
        surname: &str,
        email: &str,
        username: &str,
        password_hash: &str,
        status: Option<UserStatus>,
        roles: &[Role],
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut user = sqlx::query_as::<Postgres, User>(
            "INSERT INTO users (name, surname, email, username, password_hash, status)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(name)
        .bind(surname)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user.id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        user.roles = roles.to_vec();
        Ok(user)
    }

    /// Persist updated scalars and, when a replacement is supplied, swap the
    /// role set in the same transaction.
    #[tracing::instrument(skip(self, user, roles), fields(db.table = "users", db.operation = "update", user_id = user.id))]
    pub async fn update(&self, user: &User, roles: Option<&[Role]>) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut stored = sqlx::query_as::<Postgres, User>(
            "UPDATE users SET name = $1, surname = $2, email = $3, username = $4,
                 password_hash = $5, status = $6
             WHERE id = $7 RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.status)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(roles) = roles {
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
                .bind(stored.id)
                .execute(&mut *tx)
                .await?;
            for role in roles {
                sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                    .bind(stored.id)
                    .bind(role)
                    .execute(&mut *tx)
                    .await?;
            }
            stored.roles = roles.to_vec();
            tx.commit().await?;
        } else {
            stored.roles = load_roles(&mut *tx, stored.id).await?;
            tx.commit().await?;
        }

        Ok(stored)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete"))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Filtered, paginated listing; optionally restricted to users holding a
    /// role tag.
    #[tracing::instrument(skip(self, filters, page), fields(db.table = "users", db.operation = "select"))]
    pub async fn list(
        &self,
        filters: &HashMap<String, String>,
        role: Option<Role>,
        page: &ListParams,
    ) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        apply_filters(&mut qb, USER_FIELDS, filters);
        if let Some(role) = role {
            qb.push(" AND EXISTS(SELECT 1 FROM user_roles r WHERE r.user_id = users.id AND r.role = ")
                .push_bind(role)
                .push(")");
        }
        push_order_and_page(&mut qb, USER_FIELDS, page)?;

        let mut users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        // Batch-load role sets to avoid one query per row.
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let rows = sqlx::query_as::<Postgres, (i64, Role)>(
            "SELECT user_id, role FROM user_roles WHERE user_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: HashMap<i64, Vec<Role>> = HashMap::new();
        for (user_id, role) in rows {
            by_user.entry(user_id).or_default().push(role);
        }
        for user in &mut users {
            user.roles = by_user.remove(&user.id).unwrap_or_default();
        }
        Ok(users)
    }

    /// Owners for the admin tender listing, keyed by id.
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.acquire().await?;
        let users = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        let mut result = HashMap::new();
        for user in users {
            let user = attach_roles(&mut *conn, user).await?;
            result.insert(user.id, user);
        }
        Ok(result)
    }
}

async fn load_roles(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Role>, AppError> {
    let roles = sqlx::query_scalar::<Postgres, Role>(
        "SELECT role FROM user_roles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(roles)
}

async fn attach_roles(conn: &mut PgConnection, mut user: User) -> Result<User, AppError> {
    user.roles = load_roles(conn, user.id).await?;
    Ok(user)
}

async fn attach_roles_opt(
    conn: &mut PgConnection,
    user: Option<User>,
) -> Result<Option<User>, AppError> {
    match user {
        Some(user) => Ok(Some(attach_roles(conn, user).await?)),
        None => Ok(None),
    }
}
