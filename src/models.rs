use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub tenant_id: String,
    pub display_id: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub tenant_id: String,
    pub display_id: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = role_counters)]
#[diesel(primary_key(role))]
pub struct RoleCounter {
    pub role: String,
    pub count: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = collections)]
#[diesel(belongs_to(User, foreign_key = uploader_id))]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub uploader_id: Uuid,
    pub tenant_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = collections)]
pub struct NewCollection {
    pub id: Uuid,
    pub name: String,
    pub uploader_id: Uuid,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = pdfs)]
#[diesel(belongs_to(Collection, foreign_key = collection_id))]
pub struct Pdf {
    pub id: Uuid,
    pub filename: String,
    pub cloudinary_id: String,
    pub secure_url: String,
    pub collection_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pdfs)]
pub struct NewPdf {
    pub id: Uuid,
    pub filename: String,
    pub cloudinary_id: String,
    pub secure_url: String,
    pub collection_id: Uuid,
}
