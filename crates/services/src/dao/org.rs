use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use orgdesk_db::models::{Org, OrgUser};
use tracing::info;

use super::base::BaseDao;
use crate::store::{AddOrgUser, OrgStore, StoreError, StoreResult};

pub struct OrgDao {
    pub base: BaseDao<Org>,
    pub members: BaseDao<OrgUser>,
}

impl OrgDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Org::COLLECTION),
            members: BaseDao::new(db, OrgUser::COLLECTION),
        }
    }
}

#[async_trait]
impl OrgStore for OrgDao {
    async fn get_by_id(&self, org_id: ObjectId) -> StoreResult<Org> {
        self.base.find_by_id(org_id).await
    }

    async fn get_org_user(&self, org_id: ObjectId, user_id: ObjectId) -> StoreResult<OrgUser> {
        self.members
            .find_one(doc! { "org_id": org_id, "user_id": user_id })
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn add_org_user(&self, cmd: AddOrgUser) -> StoreResult<OrgUser> {
        let now = DateTime::now();
        let member = OrgUser {
            id: None,
            org_id: cmd.org_id,
            user_id: cmd.user_id,
            role: cmd.role,
            created_at: now,
            updated_at: now,
        };

        // The unique (org_id, user_id) index turns a second add into AlreadyExists.
        let id = self.members.insert_one(&member).await?;
        info!(org_id = %cmd.org_id, user_id = %cmd.user_id, role = %cmd.role, "Added org user");
        self.members.find_by_id(id).await
    }
}
