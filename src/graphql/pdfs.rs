use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use url::Url;
use uuid::Uuid;

use super::types::{parse_id, required, PdfObject, MAX_TEXT_LEN};
use crate::error::{AppError, AppResult};
use crate::models::{Collection, NewPdf, Pdf};
use crate::schema::{collections, pdfs};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct SavePdfInput {
    pub filename: String,
    pub cloudinary_id: String,
    pub secure_url: String,
    pub collection_id: String,
}

pub fn save_pdf(state: &AppState, input: SavePdfInput) -> AppResult<Pdf> {
    let filename = required("filename", &input.filename, MAX_TEXT_LEN)?;
    let cloudinary_id = required("cloudinaryId", &input.cloudinary_id, MAX_TEXT_LEN)?;
    let secure_url = parse_secure_url(&input.secure_url)?;
    let collection_id = parse_id("collectionId", &input.collection_id)?;

    let mut conn = state.db()?;
    let collection: Collection = collections::table.find(collection_id).first(&mut conn)?;

    let new_pdf = NewPdf {
        id: Uuid::new_v4(),
        filename,
        cloudinary_id,
        secure_url,
        collection_id: collection.id,
    };
    let pdf: Pdf = diesel::insert_into(pdfs::table)
        .values(&new_pdf)
        .get_result(&mut conn)
        .map_err(|err| match err {
            // The collection was deleted between the lookup and the insert.
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                AppError::not_found()
            }
            other => AppError::from(other),
        })?;

    tracing::info!(pdf_id = %pdf.id, collection_id = %collection.id, "saved pdf");
    Ok(pdf)
}

/// Removes the remote asset, then the row. A failed remote delete leaves
/// the row in place and is reported to the caller.
pub async fn delete_pdf(state: &AppState, pdf_id: &str) -> AppResult<Pdf> {
    let pdf_id = parse_id("id", pdf_id)?;

    let pdf: Pdf = {
        let mut conn = state.db()?;
        pdfs::table.find(pdf_id).first(&mut conn)?
    };

    if let Err(err) = state.media.destroy(&pdf.cloudinary_id).await {
        tracing::warn!(
            pdf_id = %pdf.id,
            cloudinary_id = %pdf.cloudinary_id,
            error = %err,
            "failed to delete remote asset"
        );
        return Err(err.into());
    }

    let mut conn = state.db()?;
    let deleted = diesel::delete(pdfs::table.find(pdf.id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    tracing::info!(pdf_id = %pdf.id, "deleted pdf");
    Ok(pdf)
}

fn parse_secure_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "https" => Ok(trimmed.to_string()),
        _ => Err(AppError::bad_request("secureUrl must be an https URL")),
    }
}

#[derive(Default)]
pub struct PdfMutation;

#[Object]
impl PdfMutation {
    async fn save_pdf(
        &self,
        ctx: &Context<'_>,
        filename: String,
        cloudinary_id: String,
        secure_url: String,
        collection_id: String,
    ) -> Result<PdfObject> {
        let state = ctx.data::<AppState>()?;
        let input = SavePdfInput {
            filename,
            cloudinary_id,
            secure_url,
            collection_id,
        };
        let pdf = save_pdf(state, input).map_err(|err| err.extend())?;
        Ok(pdf.into())
    }

    async fn delete_pdf(&self, ctx: &Context<'_>, id: ID) -> Result<PdfObject> {
        let state = ctx.data::<AppState>()?;
        let pdf = delete_pdf(state, &id).await.map_err(|err| err.extend())?;
        Ok(pdf.into())
    }
}
