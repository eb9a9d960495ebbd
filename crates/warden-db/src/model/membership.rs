use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::workspace_membership)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(user_id, workspace_id))]
#[diesel(belongs_to(model::actor::ActorRow, foreign_key = user_id))]
pub struct MembershipRow {
    pub user_id: i64,
    pub workspace_id: i64,
    pub role: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::workspace_membership)]
pub struct NewMembership<'a> {
    pub user_id: i64,
    pub workspace_id: i64,
    pub role: &'a str,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
