use axum::extract::Path;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::err::{Error, Violations};
use crate::models::Attendance;
use crate::repo;
use crate::{created, no_content, ok, Payload};

/// A body-supplied `session_id` is deliberately not read: the path session
/// id always wins.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreAttendance {
    pub student_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAttendance {
    pub status: Option<String>,
}

pub async fn index(Path(session_id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    let attendances = repo::attendances::find_by_session_with_student(&pg, session_id).await?;
    ok(attendances)
}

pub async fn store(
    Path(session_id): Path<Uuid>,
    Json(body): Json<StoreAttendance>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut check = Violations::new();
    match body.student_id {
        None => check.add("student_id", "The student_id field is required"),
        Some(student_id) => {
            if !repo::students::exists(&pg, student_id).await? {
                check.add(
                    "student_id",
                    format!("Student with id `{}` does not exist", student_id),
                );
            }
        }
    }
    if !repo::sessions::exists(&pg, session_id).await? {
        check.add(
            "session_id",
            format!("Session with id `{}` does not exist", session_id),
        );
    }
    check.finish()?;

    let student_id = match body.student_id {
        Some(id) => id,
        None => return Err(Error::invalid("student_id", "The student_id field is required")),
    };

    let now = Utc::now();
    let attendance = Attendance {
        id: Uuid::new_v4(),
        student_id,
        session_id,
        status: body.status,
        created_at: now,
        updated_at: now,
    };
    repo::attendances::insert(&pg, &attendance).await?;
    created(attendance)
}

pub async fn update(
    Path((session_id, attendance_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateAttendance>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut attendance = repo::attendances::find_scoped(&pg, session_id, attendance_id)
        .await?
        .ok_or_else(|| attendance_not_found(session_id, attendance_id))?;

    if let Some(status) = body.status {
        attendance.status = Some(status);
    }
    attendance.updated_at = Utc::now();

    repo::attendances::update(&pg, &attendance).await?;
    ok(attendance)
}

pub async fn destroy(
    Path((session_id, attendance_id)): Path<(Uuid, Uuid)>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    if !repo::attendances::delete_scoped(&pg, session_id, attendance_id).await? {
        return Err(attendance_not_found(session_id, attendance_id));
    }
    no_content()
}

fn attendance_not_found(session_id: Uuid, attendance_id: Uuid) -> Error {
    Error::not_found(format!(
        "Attendance with id `{}` does not exist in session `{}`!",
        attendance_id, session_id
    ))
}
