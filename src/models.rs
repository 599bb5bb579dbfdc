use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// List envelope used by the group endpoints and the list-all reads.
#[derive(Debug, Clone, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T: Serialize> Data<T> {
    pub fn of(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub speciality: Option<String>,
    pub level: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub class_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `fname` is the family name, `name` the given name; the wire names follow
/// the import column mapping ("family name" / "name").
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub fname: String,
    pub name: String,
    pub email: Option<String>,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub s_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub comment: String,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An attendance row with its student joined in, for the session-scoped
/// listing. Student columns come back aliased with an `s_` prefix.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceWithStudent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub student: Student,
}

impl FromRow<'_, PgRow> for AttendanceWithStudent {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            session_id: row.try_get("session_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            student: Student {
                id: row.try_get("s_id")?,
                fname: row.try_get("s_fname")?,
                name: row.try_get("s_name")?,
                email: row.try_get("s_email")?,
                group_id: row.try_get("s_group_id")?,
                created_at: row.try_get("s_created_at")?,
                updated_at: row.try_get("s_updated_at")?,
            },
        })
    }
}
