use axum::extract::Path;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::err::{Error, Violations};
use crate::models::Class;
use crate::repo;
use crate::{created, no_content, ok, Payload};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreClass {
    pub name: Option<String>,
    pub speciality: Option<String>,
    pub level: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClass {
    pub name: Option<String>,
    pub speciality: Option<String>,
    pub level: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
}

pub async fn index(Extension(pg): Extension<PgPool>) -> Payload {
    let classes = repo::classes::find_all(&pg).await?;
    ok(classes)
}

pub async fn store(
    Json(body): Json<StoreClass>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut check = Violations::new();
    check.require("name", body.name.as_deref());
    check.max_len("name", body.name.as_deref(), 255);
    check.max_len("speciality", body.speciality.as_deref(), 255);
    check.max_len("level", body.level.as_deref(), 255);
    check.max_len("year", body.year.as_deref(), 255);
    check.max_len("semester", body.semester.as_deref(), 255);
    check.finish()?;

    let now = Utc::now();
    let class = Class {
        id: Uuid::new_v4(),
        name: body.name.unwrap_or_default(),
        speciality: body.speciality,
        level: body.level,
        year: body.year,
        semester: body.semester,
        created_at: now,
        updated_at: now,
    };
    repo::classes::insert(&pg, &class).await?;
    created(class)
}

pub async fn update(
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateClass>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut class = repo::classes::find_by_id(&pg, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Class with id `{}` does not exist!", id)))?;

    let mut check = Violations::new();
    if body.name.is_some() {
        check.require("name", body.name.as_deref());
        check.max_len("name", body.name.as_deref(), 255);
    }
    check.max_len("speciality", body.speciality.as_deref(), 255);
    check.max_len("level", body.level.as_deref(), 255);
    check.max_len("year", body.year.as_deref(), 255);
    check.max_len("semester", body.semester.as_deref(), 255);
    check.finish()?;

    if let Some(name) = body.name {
        class.name = name;
    }
    if let Some(speciality) = body.speciality {
        class.speciality = Some(speciality);
    }
    if let Some(level) = body.level {
        class.level = Some(level);
    }
    if let Some(year) = body.year {
        class.year = Some(year);
    }
    if let Some(semester) = body.semester {
        class.semester = Some(semester);
    }
    class.updated_at = Utc::now();

    repo::classes::update(&pg, &class).await?;
    ok(class)
}

pub async fn destroy(Path(id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    if !repo::classes::delete(&pg, id).await? {
        return Err(Error::not_found(format!(
            "Class with id `{}` does not exist!",
            id
        )));
    }
    no_content()
}
