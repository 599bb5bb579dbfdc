use axum::extract::{Multipart, Path};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::err::{Error, Violations};
use crate::import::{self, ImportFormat};
use crate::models::{Data, Student};
use crate::repo;
use crate::{created, no_content, ok, Payload};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreStudent {
    pub fname: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStudent {
    pub fname: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub group_id: Option<Uuid>,
}

pub async fn all_students(Extension(pg): Extension<PgPool>) -> Payload {
    let students = repo::students::find_all(&pg).await?;
    ok(Data::of(students))
}

pub async fn index(Path(group_id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    let students = repo::students::find_by_group(&pg, group_id).await?;
    ok(students)
}

pub async fn store(
    Path(group_id): Path<Uuid>,
    Json(body): Json<StoreStudent>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut check = Violations::new();
    check.require("fname", body.fname.as_deref());
    check.max_len("fname", body.fname.as_deref(), 255);
    check.require("name", body.name.as_deref());
    check.max_len("name", body.name.as_deref(), 255);
    check.max_len("email", body.email.as_deref(), 255);
    if !repo::groups::exists(&pg, group_id).await? {
        check.add(
            "group_id",
            format!("Group with id `{}` does not exist", group_id),
        );
    }
    check.finish()?;

    let now = Utc::now();
    let student = Student {
        id: Uuid::new_v4(),
        fname: body.fname.unwrap_or_default(),
        name: body.name.unwrap_or_default(),
        email: body.email,
        group_id: Some(group_id),
        created_at: now,
        updated_at: now,
    };
    repo::students::insert(&pg, &student).await?;
    created(student)
}

pub async fn update(
    Path((group_id, id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateStudent>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut student = repo::students::find_scoped(&pg, group_id, id)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!(
                "Student with id `{}` does not exist in group `{}`!",
                id, group_id
            ))
        })?;

    let mut check = Violations::new();
    if body.fname.is_some() {
        check.require("fname", body.fname.as_deref());
        check.max_len("fname", body.fname.as_deref(), 255);
    }
    if body.name.is_some() {
        check.require("name", body.name.as_deref());
        check.max_len("name", body.name.as_deref(), 255);
    }
    check.max_len("email", body.email.as_deref(), 255);
    if let Some(new_group) = body.group_id {
        if !repo::groups::exists(&pg, new_group).await? {
            check.add(
                "group_id",
                format!("Group with id `{}` does not exist", new_group),
            );
        }
    }
    check.finish()?;

    if let Some(fname) = body.fname {
        student.fname = fname;
    }
    if let Some(name) = body.name {
        student.name = name;
    }
    if let Some(email) = body.email {
        student.email = Some(email);
    }
    if let Some(new_group) = body.group_id {
        student.group_id = Some(new_group);
    }
    student.updated_at = Utc::now();

    repo::students::update(&pg, &student).await?;
    ok(student)
}

pub async fn destroy(Path(id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    if !repo::students::delete(&pg, id).await? {
        return Err(Error::not_found(format!(
            "Student with id `{}` does not exist!",
            id
        )));
    }
    no_content()
}

/// Bulk import from an uploaded csv/xls/xlsx file. The whole batch commits
/// in a single transaction, so a bad row imports nothing.
pub async fn import(Extension(pg): Extension<PgPool>, mut multipart: Multipart) -> Payload {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(|n| n.to_string());
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = field.bytes().await?;
            upload = Some((file_name, content_type, data));
            break;
        }
    }
    let (file_name, content_type, data) =
        upload.ok_or_else(|| Error::invalid("file", "The file field is required"))?;

    let format = ImportFormat::detect(file_name.as_deref(), content_type.as_deref())
        .ok_or_else(|| Error::invalid("file", "The file must be a csv, xls or xlsx document"))?;
    let rows = import::parse(format, &data).map_err(Error::from)?;

    let mut group_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.group_id).collect();
    group_ids.sort_unstable();
    group_ids.dedup();
    let mut check = Violations::new();
    for group_id in group_ids {
        if !repo::groups::exists(&pg, group_id).await? {
            check.add(
                "file",
                format!("Group with id `{}` does not exist", group_id),
            );
        }
    }
    check.finish()?;

    let now = Utc::now();
    let students: Vec<Student> = rows
        .into_iter()
        .map(|row| Student {
            id: Uuid::new_v4(),
            fname: row.fname,
            name: row.name,
            email: row.email,
            group_id: row.group_id,
            created_at: now,
            updated_at: now,
        })
        .collect();
    let imported = students.len();
    repo::students::insert_many(&pg, &students).await?;

    log::info!("Imported {} students from an uploaded file", imported);
    ok(serde_json::json!({
        "message": "Students imported successfully",
        "imported": imported,
    }))
}
