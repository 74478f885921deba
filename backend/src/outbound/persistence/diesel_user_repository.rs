//! PostgreSQL-backed `UserRepository` and `UserGroupRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::ports::{
    UserGroupPersistenceError, UserGroupRepository, UserPersistenceError, UserRepository,
};
use crate::domain::user_group::{GroupStats, UserGroup};
use crate::domain::{EmailAddress, User, UserId};

use super::diesel_error_mapping::{
    convert_rows, count_u64, map_basic_diesel_error, map_basic_pool_error, offset_i64,
    unique_violation,
};
use super::models::{UserGroupRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{customers, proposals, user_groups, users};

/// Diesel-backed user account storage.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// `users.email` is the only unique column besides the key.
fn map_write_error(error: diesel::result::Error, user: &User) -> UserPersistenceError {
    if unique_violation(&error).is_some() {
        return UserPersistenceError::duplicate_email(user.email.as_str());
    }
    map_diesel_error(error)
}

fn to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    User::try_from(row).map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(to_user).transpose()
    }

    async fn list(&self, page: PageRequest) -> Result<Paginated<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = users::table
            .filter(users::is_deleted.eq(false))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::is_deleted.eq(false))
            .select(UserRow::as_select())
            .order_by((users::name, users::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = convert_rows(rows, UserPersistenceError::query)?;
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(UserRow::from(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, user))
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(user.id.as_uuid()))
            .set(UserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, user))?;
        if updated == 0 {
            return Err(UserPersistenceError::query("user not found for update"));
        }
        Ok(())
    }
}

/// Diesel-backed user group storage.
#[derive(Clone)]
pub struct DieselUserGroupRepository {
    pool: DbPool,
}

impl DieselUserGroupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_group_pool_error(error: PoolError) -> UserGroupPersistenceError {
    map_basic_pool_error(error, UserGroupPersistenceError::connection)
}

fn map_group_diesel_error(error: diesel::result::Error) -> UserGroupPersistenceError {
    map_basic_diesel_error(
        error,
        UserGroupPersistenceError::query,
        UserGroupPersistenceError::connection,
    )
}

fn map_group_write_error(
    error: diesel::result::Error,
    group: &UserGroup,
) -> UserGroupPersistenceError {
    if unique_violation(&error).is_some() {
        return UserGroupPersistenceError::duplicate_name(group.name.as_str());
    }
    map_group_diesel_error(error)
}

fn group_row(group: &UserGroup) -> Result<UserGroupRow, UserGroupPersistenceError> {
    UserGroupRow::try_from(group).map_err(UserGroupPersistenceError::query)
}

#[async_trait]
impl UserGroupRepository for DieselUserGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroup>, UserGroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_group_pool_error)?;
        let row: Option<UserGroupRow> = user_groups::table
            .find(id)
            .select(UserGroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_group_diesel_error)?;
        row.map(UserGroup::try_from)
            .transpose()
            .map_err(UserGroupPersistenceError::query)
    }

    async fn list(&self) -> Result<Vec<UserGroup>, UserGroupPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_group_pool_error)?;
        let rows: Vec<UserGroupRow> = user_groups::table
            .filter(user_groups::is_deleted.eq(false))
            .select(UserGroupRow::as_select())
            .order_by(user_groups::name)
            .load(&mut conn)
            .await
            .map_err(map_group_diesel_error)?;
        convert_rows(rows, UserGroupPersistenceError::query)
    }

    async fn insert(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError> {
        let row = group_row(group)?;
        let mut conn = self.pool.get().await.map_err(map_group_pool_error)?;
        diesel::insert_into(user_groups::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_group_write_error(err, group))
    }

    async fn update(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError> {
        let row = group_row(group)?;
        let mut conn = self.pool.get().await.map_err(map_group_pool_error)?;
        let updated = diesel::update(user_groups::table.find(group.id))
            .set(row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_group_write_error(err, group))?;
        if updated == 0 {
            return Err(UserGroupPersistenceError::query("group not found for update"));
        }
        Ok(())
    }

    async fn stats(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, GroupStats>, UserGroupPersistenceError> {
        let mut stats: HashMap<Uuid, GroupStats> =
            ids.iter().map(|id| (*id, GroupStats::default())).collect();
        if ids.is_empty() {
            return Ok(stats);
        }
        let mut conn = self.pool.get().await.map_err(map_group_pool_error)?;
        let members: Vec<(Option<Uuid>, i64)> = users::table
            .filter(users::group_id.eq_any(ids))
            .filter(users::is_deleted.eq(false))
            .group_by(users::group_id)
            .select((users::group_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_group_diesel_error)?;
        let clients: Vec<(Option<Uuid>, i64)> = customers::table
            .filter(customers::group_id.eq_any(ids))
            .filter(customers::is_deleted.eq(false))
            .group_by(customers::group_id)
            .select((customers::group_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_group_diesel_error)?;
        let quotes: Vec<(Option<Uuid>, i64)> = proposals::table
            .filter(proposals::owner_group_id.eq_any(ids))
            .filter(proposals::is_deleted.eq(false))
            .group_by(proposals::owner_group_id)
            .select((proposals::owner_group_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_group_diesel_error)?;
        tally(&mut stats, members, |entry, n| entry.users = n);
        tally(&mut stats, clients, |entry, n| entry.customers = n);
        tally(&mut stats, quotes, |entry, n| entry.proposals = n);
        Ok(stats)
    }
}

/// Fold grouped `(group_id, count)` rows into the requested entries.
fn tally(
    stats: &mut HashMap<Uuid, GroupStats>,
    rows: Vec<(Option<Uuid>, i64)>,
    apply: impl Fn(&mut GroupStats, u64),
) {
    for (group, count) in rows {
        if let Some(entry) = group.and_then(|id| stats.get_mut(&id)) {
            apply(entry, count_u64(count));
        }
    }
}
