use std::collections::HashMap;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use orgdesk_db::models::{Invite, InviteStatus, User};

use super::base::BaseDao;
use crate::store::{CreateInvite, InviteStore, InviteView, StoreError, StoreResult};

pub struct InviteDao {
    pub base: BaseDao<Invite>,
    users: BaseDao<User>,
}

impl InviteDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invite::COLLECTION),
            users: BaseDao::new(db, User::COLLECTION),
        }
    }

    async fn with_inviters(&self, invites: Vec<Invite>) -> StoreResult<Vec<InviteView>> {
        let inviter_ids: Vec<ObjectId> = invites.iter().map(|i| i.invited_by_user_id).collect();

        let inviters: HashMap<ObjectId, User> = self
            .users
            .find_many(doc! { "_id": { "$in": inviter_ids } }, None)
            .await?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();

        Ok(invites
            .into_iter()
            .map(|invite| {
                let inviter = inviters.get(&invite.invited_by_user_id);
                InviteView {
                    invited_by_login: inviter.map(|u| u.login.clone()).unwrap_or_default(),
                    invited_by_email: inviter.map(|u| u.email.clone()).unwrap_or_default(),
                    invited_by_name: inviter.map(|u| u.name.clone()).unwrap_or_default(),
                    invite,
                }
            })
            .collect())
    }
}

#[async_trait]
impl InviteStore for InviteDao {
    async fn create(&self, cmd: CreateInvite) -> StoreResult<Invite> {
        let now = DateTime::now();
        let invite = Invite {
            id: None,
            org_id: cmd.org_id,
            code: cmd.code,
            email: cmd.email,
            name: cmd.name,
            role: cmd.role,
            invited_by_user_id: cmd.invited_by_user_id,
            status: InviteStatus::Pending,
            email_sent: false,
            email_sent_on: None,
            remote_addr: cmd.remote_addr,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&invite).await?;
        self.base.find_by_id(id).await
    }

    async fn list_by_status(
        &self,
        org_id: ObjectId,
        status: InviteStatus,
    ) -> StoreResult<Vec<InviteView>> {
        let invites = self
            .base
            .find_many(
                doc! { "org_id": org_id, "status": bson::to_bson(&status)? },
                Some(doc! { "created_at": -1 }),
            )
            .await?;
        self.with_inviters(invites).await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<InviteView> {
        let invite = self
            .base
            .find_one(doc! { "code": code })
            .await?
            .ok_or(StoreError::NotFound)?;
        self.with_inviters(vec![invite])
            .await?
            .pop()
            .ok_or(StoreError::NotFound)
    }

    async fn update_status(&self, code: &str, status: InviteStatus) -> StoreResult<()> {
        if !InviteStatus::Pending.can_transition_to(status) {
            return Err(StoreError::Other(format!(
                "invite cannot move to status {status}"
            )));
        }

        // Matches pending invites only; terminal ones are never rewritten.
        let matched = self
            .base
            .set_one(
                doc! { "code": code, "status": bson::to_bson(&InviteStatus::Pending)? },
                doc! { "status": bson::to_bson(&status)? },
            )
            .await?;
        if !matched {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_email_sent(&self, code: &str) -> StoreResult<()> {
        let matched = self
            .base
            .set_one(
                doc! { "code": code },
                doc! { "email_sent": true, "email_sent_on": DateTime::now() },
            )
            .await?;
        if !matched {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
