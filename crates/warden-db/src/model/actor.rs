use crate::db::schema;
use diesel::{pg::Pg, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::actor)]
#[diesel(check_for_backend(Pg))]
pub struct ActorRow {
    pub id: i64,
    pub role: String,
    pub disabled: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::actor)]
pub struct NewActor<'a> {
    pub id: i64,
    pub role: &'a str,
}
