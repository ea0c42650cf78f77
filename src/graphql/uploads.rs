use async_graphql::{Context, Object, Result};

use super::types::UploadSignatureObject;
use crate::state::AppState;

#[derive(Default)]
pub struct UploadMutation;

#[Object]
impl UploadMutation {
    /// Signs a direct browser upload for the current server time. Client
    /// supplied timestamps are never accepted.
    async fn get_upload_signature(&self, ctx: &Context<'_>) -> Result<UploadSignatureObject> {
        let state = ctx.data::<AppState>()?;
        let signed = state.signer.sign_upload();
        tracing::debug!(timestamp = signed.timestamp, "issued upload signature");
        Ok(signed.into())
    }
}
