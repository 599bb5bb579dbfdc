pub mod attendance;
pub mod classes;
pub mod err;
pub mod groups;
pub mod import;
pub mod models;
pub mod repo;
pub mod sessions;
pub mod students;

use std::net::SocketAddr;

use anyhow::Context;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

use crate::err::Error;

pub type Payload = Result<Response, Error>;

pub fn ok<V>(value: V) -> Payload
where
    V: Serialize,
{
    Ok(Json(value).into_response())
}

pub fn created<V>(value: V) -> Payload
where
    V: Serialize,
{
    Ok((StatusCode::CREATED, Json(value)).into_response())
}

pub fn no_content() -> Payload {
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn api_routes() -> Router {
    Router::new()
        .route("/classes", get(classes::index).post(classes::store))
        .route("/classes/:id", put(classes::update).delete(classes::destroy))
        .route("/classes/:id/groups", get(groups::index).post(groups::store))
        .route(
            "/classes/:id/groups/:group_id",
            get(groups::show).put(groups::update).delete(groups::destroy),
        )
        .route("/groups", get(groups::all_groups))
        .route(
            "/groups/:group_id/students",
            get(students::index).post(students::store),
        )
        .route("/groups/:group_id/students/:id", put(students::update))
        .route(
            "/groups/:group_id/session",
            get(sessions::index).post(sessions::store),
        )
        .route("/groups/:group_id/session/:id", put(sessions::update))
        .route("/students", get(students::all_students))
        .route("/students/import", post(students::import))
        .route("/students/:id", delete(students::destroy))
        .route("/session", get(sessions::all_sessions))
        .route("/session/:id", delete(sessions::destroy))
        .route(
            "/session/:id/attendances",
            get(attendance::index).post(attendance::store),
        )
        .route(
            "/session/:id/attendances/:attendance_id",
            put(attendance::update).delete(attendance::destroy),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("could not connect to the database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app = Router::new()
        .nest("/api", api_routes())
        .fallback(err::handler404.into_service())
        .layer(Extension(pool));

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .context("BIND_ADDR must be a socket address")?;
    log::info!("Starting Rollbook HTTP Server on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
