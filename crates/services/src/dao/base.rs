use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{StoreError, StoreResult};

const DUPLICATE_KEY: i32 = 11000;

pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<T>(collection_name),
        }
    }

    pub async fn find_by_id(&self, id: ObjectId) -> StoreResult<T> {
        self.collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::NotFound)
    }

    pub async fn find_one(&self, filter: Document) -> StoreResult<Option<T>> {
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_many(&self, filter: Document, sort: Option<Document>) -> StoreResult<Vec<T>> {
        let cursor = match sort {
            Some(sort) => self.collection.find(filter).sort(sort).await?,
            None => self.collection.find(filter).await?,
        };
        Ok(cursor.try_collect().await?)
    }

    /// Inserts `doc`, reporting unique-index violations as `AlreadyExists`.
    pub async fn insert_one(&self, doc: &T) -> StoreResult<ObjectId> {
        let result = self.collection.insert_one(doc).await.map_err(|e| {
            if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                ref write_error,
            )) = *e.kind
            {
                if write_error.code == DUPLICATE_KEY {
                    return StoreError::AlreadyExists(write_error.message.clone());
                }
            }
            StoreError::Mongo(e)
        })?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Other("inserted_id is not an ObjectId".to_string()))?;
        debug!(?id, "Inserted document");
        Ok(id)
    }

    /// Applies `$set: set` plus a fresh `updated_at` to the first match.
    /// Returns whether anything matched.
    pub async fn set_one(&self, filter: Document, mut set: Document) -> StoreResult<bool> {
        set.insert("updated_at", bson::DateTime::now());
        let result = self
            .collection
            .update_one(filter, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }
}
