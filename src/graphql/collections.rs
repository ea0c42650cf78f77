use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use diesel::prelude::*;
use futures_util::future::join_all;
use uuid::Uuid;

use super::types::{parse_id, required, CollectionObject, MAX_TEXT_LEN};
use crate::error::{AppError, AppResult};
use crate::models::{Collection, NewCollection, Pdf, User};
use crate::schema::{collections, pdfs, users};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CreateCollectionInput {
    pub name: String,
    pub uploader_id: String,
    pub tenant_id: String,
}

pub fn list_uploader_collections(
    state: &AppState,
    uploader_id: &str,
) -> AppResult<Vec<(Collection, Vec<Pdf>)>> {
    let uploader_id = parse_id("uploaderId", uploader_id)?;
    let mut conn = state.db()?;

    let owned: Vec<Collection> = collections::table
        .filter(collections::uploader_id.eq(uploader_id))
        .order((collections::created_at.asc(), collections::id.asc()))
        .load(&mut conn)?;

    let grouped: Vec<Vec<Pdf>> = Pdf::belonging_to(&owned)
        .order((pdfs::created_at.asc(), pdfs::id.asc()))
        .load::<Pdf>(&mut conn)?
        .grouped_by(&owned);

    Ok(owned.into_iter().zip(grouped).collect())
}

pub fn create_collection(state: &AppState, input: CreateCollectionInput) -> AppResult<Collection> {
    let name = required("name", &input.name, MAX_TEXT_LEN)?;
    let tenant_id = required("tenantId", &input.tenant_id, MAX_TEXT_LEN)?;
    let uploader_id = parse_id("uploaderId", &input.uploader_id)?;

    let mut conn = state.db()?;
    let uploader: User = users::table.find(uploader_id).first(&mut conn)?;

    let new_collection = NewCollection {
        id: Uuid::new_v4(),
        name,
        uploader_id: uploader.id,
        tenant_id,
    };
    let collection: Collection = diesel::insert_into(collections::table)
        .values(&new_collection)
        .get_result(&mut conn)?;

    tracing::info!(collection_id = %collection.id, uploader_id = %uploader.id, "created collection");
    Ok(collection)
}

/// What the local half of a collection delete did.
enum CollectionDelete {
    Removed,
    /// Some remote deletes failed.
    Kept,
    /// PDFs were saved into the collection after it was loaded.
    Grew(i64),
}

/// Deletes a collection together with its PDFs.
///
/// Every remote asset delete is attempted once, concurrently. Rows whose
/// asset is gone are removed in one transaction; the collection row goes
/// with them only when every asset delete succeeded and no PDF was added in
/// the meantime. Otherwise the failures are reported together and the
/// remaining rows stay for a retry.
pub async fn delete_collection(
    state: &AppState,
    collection_id: &str,
) -> AppResult<(Collection, Vec<Pdf>)> {
    let collection_id = parse_id("id", collection_id)?;

    let (collection, owned_pdfs) = {
        let mut conn = state.db()?;
        let collection: Collection = collections::table.find(collection_id).first(&mut conn)?;
        let owned_pdfs: Vec<Pdf> = Pdf::belonging_to(&collection)
            .order((pdfs::created_at.asc(), pdfs::id.asc()))
            .load(&mut conn)?;
        (collection, owned_pdfs)
    };

    let outcomes = join_all(
        owned_pdfs
            .iter()
            .map(|pdf| state.media.destroy(&pdf.cloudinary_id)),
    )
    .await;

    let mut removed_ids = Vec::with_capacity(owned_pdfs.len());
    let mut failures = Vec::new();
    for (pdf, outcome) in owned_pdfs.iter().zip(outcomes) {
        match outcome {
            Ok(()) => removed_ids.push(pdf.id),
            Err(err) => {
                tracing::warn!(
                    collection_id = %collection.id,
                    pdf_id = %pdf.id,
                    cloudinary_id = %pdf.cloudinary_id,
                    error = %err,
                    "failed to delete remote asset"
                );
                failures.push(format!("{}: {err}", pdf.cloudinary_id));
            }
        }
    }

    let all_removed = failures.is_empty();
    let mut conn = state.db()?;
    let outcome = conn.transaction::<_, AppError, _>(|conn| {
        // Holding the row lock makes a concurrent savePdf either commit
        // before the count below or wait until this transaction is done.
        collections::table
            .find(collection.id)
            .for_update()
            .first::<Collection>(conn)?;
        if !removed_ids.is_empty() {
            diesel::delete(pdfs::table.filter(pdfs::id.eq_any(&removed_ids))).execute(conn)?;
        }
        if !all_removed {
            return Ok(CollectionDelete::Kept);
        }
        let remaining: i64 = pdfs::table
            .filter(pdfs::collection_id.eq(collection.id))
            .count()
            .get_result(conn)?;
        if remaining > 0 {
            return Ok(CollectionDelete::Grew(remaining));
        }
        diesel::delete(collections::table.find(collection.id)).execute(conn)?;
        Ok(CollectionDelete::Removed)
    })?;

    match outcome {
        CollectionDelete::Removed => {}
        CollectionDelete::Kept => {
            return Err(AppError::upstream(format!(
                "failed to delete {} of {} assets from the media host; collection kept: {}",
                failures.len(),
                owned_pdfs.len(),
                failures.join("; ")
            )));
        }
        CollectionDelete::Grew(remaining) => {
            tracing::warn!(
                collection_id = %collection.id,
                remaining,
                "pdfs were added while the collection was being deleted"
            );
            return Err(AppError::conflict(format!(
                "{remaining} pdf(s) were added to the collection during deletion; collection kept"
            )));
        }
    }

    tracing::info!(
        collection_id = %collection.id,
        pdf_count = owned_pdfs.len(),
        "deleted collection"
    );
    Ok((collection, owned_pdfs))
}

#[derive(Default)]
pub struct CollectionQuery;

#[Object]
impl CollectionQuery {
    async fn my_collections(
        &self,
        ctx: &Context<'_>,
        uploader_id: String,
    ) -> Result<Vec<CollectionObject>> {
        let state = ctx.data::<AppState>()?;
        let rows = list_uploader_collections(state, &uploader_id).map_err(|err| err.extend())?;
        Ok(rows
            .into_iter()
            .map(|(collection, pdfs)| CollectionObject::new(collection, pdfs))
            .collect())
    }
}

#[derive(Default)]
pub struct CollectionMutation;

#[Object]
impl CollectionMutation {
    async fn create_collection(
        &self,
        ctx: &Context<'_>,
        name: String,
        uploader_id: String,
        tenant_id: String,
    ) -> Result<CollectionObject> {
        let state = ctx.data::<AppState>()?;
        let input = CreateCollectionInput {
            name,
            uploader_id,
            tenant_id,
        };
        let collection = create_collection(state, input).map_err(|err| err.extend())?;
        Ok(CollectionObject::new(collection, Vec::new()))
    }

    async fn delete_collection(&self, ctx: &Context<'_>, id: ID) -> Result<CollectionObject> {
        let state = ctx.data::<AppState>()?;
        let (collection, pdfs) = delete_collection(state, &id)
            .await
            .map_err(|err| err.extend())?;
        Ok(CollectionObject::new(collection, pdfs))
    }
}
