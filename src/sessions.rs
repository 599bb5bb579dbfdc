use axum::extract::Path;
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::err::{Error, Violations};
use crate::models::{Data, Session};
use crate::repo;
use crate::{created, no_content, ok, Payload};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSession {
    pub s_date: Option<String>,
    pub end_date: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSession {
    pub s_date: Option<String>,
    pub end_date: Option<String>,
    pub comment: Option<String>,
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD` (taken as
/// midnight UTC). Everything is normalized to UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

fn checked_date(
    check: &mut Violations,
    field: &str,
    value: Option<&str>,
) -> Option<DateTime<Utc>> {
    match value {
        None => {
            check.add(field, format!("The {} field is required", field));
            None
        }
        Some(raw) if raw.trim().is_empty() => {
            check.add(field, format!("The {} field is required", field));
            None
        }
        Some(raw) => match parse_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                check.add(field, format!("The {} field must be a valid date", field));
                None
            }
        },
    }
}

pub async fn all_sessions(Extension(pg): Extension<PgPool>) -> Payload {
    let sessions = repo::sessions::find_all(&pg).await?;
    ok(Data::of(sessions))
}

pub async fn index(Path(group_id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    let sessions = repo::sessions::find_by_group(&pg, group_id).await?;
    ok(sessions)
}

pub async fn store(
    Path(group_id): Path<Uuid>,
    Json(body): Json<StoreSession>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut check = Violations::new();
    let s_date = checked_date(&mut check, "s_date", body.s_date.as_deref());
    let end_date = checked_date(&mut check, "end_date", body.end_date.as_deref());
    check.require("comment", body.comment.as_deref());
    if !repo::groups::exists(&pg, group_id).await? {
        check.add(
            "group_id",
            format!("Group with id `{}` does not exist", group_id),
        );
    }
    check.finish()?;

    let (s_date, end_date) = match (s_date, end_date) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(Error::invalid("s_date", "The s_date field must be a valid date")),
    };

    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4(),
        s_date,
        end_date,
        comment: body.comment.unwrap_or_default(),
        group_id,
        created_at: now,
        updated_at: now,
    };
    repo::sessions::insert(&pg, &session).await?;
    created(session)
}

pub async fn update(
    Path((group_id, id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateSession>,
    Extension(pg): Extension<PgPool>,
) -> Payload {
    let mut session = repo::sessions::find_scoped(&pg, group_id, id)
        .await?
        .ok_or_else(|| session_not_found(group_id, id))?;

    let mut check = Violations::new();
    let s_date = match body.s_date.as_deref() {
        Some(raw) => Some(checked_date(&mut check, "s_date", Some(raw))),
        None => None,
    };
    let end_date = match body.end_date.as_deref() {
        Some(raw) => Some(checked_date(&mut check, "end_date", Some(raw))),
        None => None,
    };
    if body.comment.is_some() {
        check.require("comment", body.comment.as_deref());
    }
    check.finish()?;

    if let Some(Some(s_date)) = s_date {
        session.s_date = s_date;
    }
    if let Some(Some(end_date)) = end_date {
        session.end_date = end_date;
    }
    if let Some(comment) = body.comment {
        session.comment = comment;
    }
    session.updated_at = Utc::now();

    repo::sessions::update(&pg, &session).await?;
    ok(session)
}

pub async fn destroy(Path(id): Path<Uuid>, Extension(pg): Extension<PgPool>) -> Payload {
    if !repo::sessions::delete(&pg, id).await? {
        return Err(Error::not_found(format!(
            "Session with id `{}` does not exist!",
            id
        )));
    }
    no_content()
}

fn session_not_found(group_id: Uuid, id: Uuid) -> Error {
    Error::not_found(format!(
        "Session with id `{}` does not exist in group `{}`!",
        id, group_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_datetime("2024-03-01T09:30:00+01:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn parses_space_separated_datetime() {
        let dt = parse_datetime("2024-03-01 09:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let dt = parse_datetime("2024-03-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("2024-13-99").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn checked_date_reports_missing_and_malformed() {
        let mut check = Violations::new();
        assert!(checked_date(&mut check, "s_date", None).is_none());
        assert!(checked_date(&mut check, "end_date", Some("tomorrow")).is_none());
        assert!(check.finish().is_err());

        let mut check = Violations::new();
        assert!(checked_date(&mut check, "s_date", Some("2024-03-01")).is_some());
        assert!(check.finish().is_ok());
    }
}
