use axum::extract::Path;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::err::{Error, Violations};
use crate::models::{Data, Group};
use crate::repo;
use crate::{created, no_content, ok, Payload};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreGroup {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn all_groups(Extension(pg): Extension<PgPool>) -> Payload {
    let groups = repo::groups::find_all(&pg).await?;
    ok(Data::of(groups))
}

pub async fn index(Path(class_id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    let groups = repo::groups::find_by_class(&pg, class_id).await?;
    ok(Data::of(groups))
}

pub async fn store(
    Path(class_id): Path<Uuid>,
    Json(body): Json<StoreGroup>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut check = Violations::new();
    check.require("name", body.name.as_deref());
    check.max_len("name", body.name.as_deref(), 255);
    check.require("type", body.kind.as_deref());
    check.max_len("type", body.kind.as_deref(), 255);
    if !repo::classes::exists(&pg, class_id).await? {
        check.add(
            "class_id",
            format!("Class with id `{}` does not exist", class_id),
        );
    }
    check.finish()?;

    let now = Utc::now();
    let group = Group {
        id: Uuid::new_v4(),
        name: body.name.unwrap_or_default(),
        kind: body.kind.unwrap_or_default(),
        class_id,
        created_at: now,
        updated_at: now,
    };
    repo::groups::insert(&pg, &group).await?;
    created(Data::of(group))
}

pub async fn show(
    Path((class_id, group_id)): Path<(Uuid, Uuid)>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let group = repo::groups::find_scoped(&pg, class_id, group_id)
        .await?
        .ok_or_else(|| group_not_found(class_id, group_id))?;
    ok(Data::of(group))
}

pub async fn update(
    Path((class_id, group_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateGroup>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut group = repo::groups::find_scoped(&pg, class_id, group_id)
        .await?
        .ok_or_else(|| group_not_found(class_id, group_id))?;

    let mut check = Violations::new();
    if body.name.is_some() {
        check.require("name", body.name.as_deref());
        check.max_len("name", body.name.as_deref(), 255);
    }
    if body.kind.is_some() {
        check.require("type", body.kind.as_deref());
        check.max_len("type", body.kind.as_deref(), 255);
    }
    check.finish()?;

    if let Some(name) = body.name {
        group.name = name;
    }
    if let Some(kind) = body.kind {
        group.kind = kind;
    }
    group.updated_at = Utc::now();

    repo::groups::update(&pg, &group).await?;
    ok(Data::of(group))
}

pub async fn destroy(
    Path((class_id, group_id)): Path<(Uuid, Uuid)>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    if !repo::groups::delete_scoped(&pg, class_id, group_id).await? {
        return Err(group_not_found(class_id, group_id));
    }
    no_content()
}

fn group_not_found(class_id: Uuid, group_id: Uuid) -> Error {
    Error::not_found(format!(
        "Group with id `{}` does not exist in class `{}`!",
        group_id, class_id
    ))
}
