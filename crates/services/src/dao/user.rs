use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use orgdesk_db::models::User;

use super::base::BaseDao;
use crate::store::{CreateUser, StoreError, StoreResult, UserStore};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for UserDao {
    async fn get_by_id(&self, id: ObjectId) -> StoreResult<User> {
        self.base.find_by_id(id).await
    }

    async fn get_by_login(&self, login_or_email: &str) -> StoreResult<User> {
        self.base
            .find_one(doc! {
                "$or": [
                    { "login": login_or_email },
                    { "email": login_or_email },
                ]
            })
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, cmd: CreateUser) -> StoreResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email: cmd.email,
            login: cmd.login,
            name: cmd.name,
            password_hash: Some(cmd.password_hash),
            is_superuser: false,
            org_id: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    async fn set_using_org(&self, user_id: ObjectId, org_id: ObjectId) -> StoreResult<()> {
        let matched = self
            .base
            .set_one(doc! { "_id": user_id }, doc! { "org_id": org_id })
            .await?;
        if !matched {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
