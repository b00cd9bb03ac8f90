use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Invite, Org, OrgUser, User};

/// Creates the indexes the stores rely on for uniqueness.
///
/// Invite codes and `(org_id, user_id)` memberships are unique.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "login": 1 }),
        ],
    )
    .await?;

    create_indexes(db, Org::COLLECTION, vec![index(bson::doc! { "name": 1 })]).await?;

    create_indexes(
        db,
        OrgUser::COLLECTION,
        vec![
            index_unique(bson::doc! { "org_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        Invite::COLLECTION,
        vec![
            index_unique(bson::doc! { "code": 1 }),
            index(bson::doc! { "org_id": 1, "status": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
