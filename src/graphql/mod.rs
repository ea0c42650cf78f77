use async_graphql::{EmptySubscription, MergedObject, Schema, SchemaBuilder};

use crate::state::AppState;

pub mod collections;
pub mod pdfs;
pub mod types;
pub mod uploads;
pub mod users;

#[derive(MergedObject, Default)]
#[graphql(name = "Query")]
pub struct QueryRoot(users::UserQuery, collections::CollectionQuery);

#[derive(MergedObject, Default)]
#[graphql(name = "Mutation")]
pub struct MutationRoot(
    users::UserMutation,
    uploads::UploadMutation,
    pdfs::PdfMutation,
    collections::CollectionMutation,
);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn schema_builder() -> SchemaBuilder<QueryRoot, MutationRoot, EmptySubscription> {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
}

pub fn build_schema(state: AppState) -> AppSchema {
    schema_builder().data(state).finish()
}

#[cfg(test)]
mod tests {
    use super::schema_builder;

    #[test]
    fn sdl_exposes_the_dashboard_contract() {
        let sdl = schema_builder().finish().sdl();
        for expected in [
            "users: [User!]!",
            "myCollections(uploaderId: String!): [Collection!]!",
            "createUser(email: String!, role: String!, tenantId: String!, password: String): User!",
            "getUploadSignature: CloudinarySignature!",
            "savePdf(filename: String!, cloudinaryId: String!, secureUrl: String!, collectionId: String!): PDF!",
            "createCollection(name: String!, uploaderId: String!, tenantId: String!): Collection!",
            "deletePdf(id: ID!): PDF!",
            "deleteCollection(id: ID!): Collection!",
            "display_id: String!",
            "secure_url: String!",
            "tenant_id: String!",
            "apiKey: String!",
            "cloudName: String!",
            "timestamp: Int!",
            "type Query",
            "type Mutation",
        ] {
            assert!(sdl.contains(expected), "missing `{expected}` in:\n{sdl}");
        }
    }
}
