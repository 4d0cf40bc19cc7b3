use super::auth;
use super::error::AppError;
use super::AppState;
use crate::describe::format_description;
use crate::import::{run_import, ImportBundle, ImportReport};
use crate::media::{list_media, MediaListing};
use crate::model::{Event, GameClass, Item, LevelValues, Post, PostKind, Skill, Tag, Talent, WeeklySchedule};
use crate::storage::PostFilter;
use crate::sync::{run_sync, SyncOptions, SyncReport};
use crate::talent_grid::{Grid, GRID_COLUMNS, GRID_ROWS};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, AppError>;

const DEFAULT_EVENT_LIMIT: usize = 20;
const MAX_EVENT_LIMIT: usize = 100;

/// Description rendered both ways
#[derive(Debug, Serialize)]
pub struct FormattedText {
    pub plain: String,
    pub html: String,
    pub has_pvp: bool,
}

impl FormattedText {
    fn new(template: &str, values: &LevelValues, max_level: u32) -> Self {
        let formatted = format_description(template, values, max_level);
        Self {
            plain: formatted.to_plain(),
            html: formatted.to_html(),
            has_pvp: formatted.has_pvp(),
        }
    }
}

/// A record together with its formatted description
#[derive(Debug, Serialize)]
pub struct Described<T> {
    #[serde(flatten)]
    pub record: T,
    pub formatted_description: FormattedText,
}

fn describe_skill(skill: Skill) -> Described<Skill> {
    let formatted_description = FormattedText::new(&skill.description, &skill.level_values, skill.max_level);
    Described { record: skill, formatted_description }
}

fn describe_talent(talent: Talent) -> Described<Talent> {
    let formatted_description = FormattedText::new(&talent.description, &talent.level_values, talent.max_level);
    Described { record: talent, formatted_description }
}

#[derive(Debug, Serialize)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: GameClass,
    pub skills: Vec<Described<Skill>>,
    pub talents: Vec<Described<Talent>>,
}

#[derive(Debug, Serialize)]
pub struct SkillDetail {
    #[serde(flatten)]
    pub skill: Described<Skill>,
    /// Slugs of the classes using this skill
    pub classes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TalentGridResponse {
    pub class: String,
    pub columns: u32,
    pub rows: u32,
    pub grid: Grid,
    pub talents: Vec<Described<Talent>>,
}

#[derive(Deserialize)]
pub struct GridParams {
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct ItemParams {
    pub type_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct PostParams {
    pub kind: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct EventParams {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct MediaParams {
    pub path: Option<String>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ========== Game data ==========

pub async fn list_classes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<GameClass>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_classes()?))
}

pub async fn get_class(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> ApiResult<ClassDetail> {
    let store = state.store.lock().await;
    let class = store
        .get_class_by_slug(&slug)?
        .ok_or_else(|| AppError::NotFound(format!("class '{}'", slug)))?;
    let skills = store.skills_for_class(class.id)?.into_iter().map(describe_skill).collect();
    let talents = store.talents_for_class(class.id)?.into_iter().map(describe_talent).collect();
    Ok(Json(ClassDetail { class, skills, talents }))
}

pub async fn get_talent_grid(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<GridParams>,
) -> Result<Response, AppError> {
    let store = state.store.lock().await;
    let class = store
        .get_class_by_slug(&slug)?
        .ok_or_else(|| AppError::NotFound(format!("class '{}'", slug)))?;
    let grid = class.talent_tree.clone().unwrap_or_default().render();
    let talents = store.talents_for_class(class.id)?;

    match params.format.as_deref() {
        Some("html") => {
            let by_id: HashMap<i64, Talent> = talents.into_iter().map(|t| (t.id, t)).collect();
            Ok(Html(grid.to_html(&by_id)).into_response())
        }
        None | Some("json") => Ok(Json(TalentGridResponse {
            class: class.slug,
            columns: GRID_COLUMNS,
            rows: GRID_ROWS,
            grid,
            talents: talents.into_iter().map(describe_talent).collect(),
        })
        .into_response()),
        Some(other) => Err(AppError::BadRequest(format!("unknown format '{}'", other))),
    }
}

pub async fn get_skill(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> ApiResult<SkillDetail> {
    let store = state.store.lock().await;
    let skill = store
        .get_skill_by_slug(&slug)?
        .ok_or_else(|| AppError::NotFound(format!("skill '{}'", slug)))?;
    let classes = store.classes_for_skill(skill.id)?.into_iter().map(|c| c.slug).collect();
    Ok(Json(SkillDetail { skill: describe_skill(skill), classes }))
}

pub async fn list_items(State(state): State<Arc<AppState>>, Query(params): Query<ItemParams>) -> ApiResult<Vec<Item>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_items(params.type_id)?))
}

pub async fn get_item(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> ApiResult<Item> {
    let store = state.store.lock().await;
    let item = store
        .get_item_by_slug(&slug)?
        .ok_or_else(|| AppError::NotFound(format!("item '{}'", slug)))?;
    Ok(Json(item))
}

// ========== Posts ==========

pub async fn list_posts(State(state): State<Arc<AppState>>, Query(params): Query<PostParams>) -> ApiResult<Vec<Post>> {
    let kind = params.kind.as_deref().map(PostKind::from_str).transpose()?;
    let filter = PostFilter { kind, tag: params.tag, limit: params.limit, ..PostFilter::published() };
    let store = state.store.lock().await;
    Ok(Json(store.list_posts(&filter)?))
}

pub async fn get_post(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> ApiResult<Post> {
    let store = state.store.lock().await;
    match store.get_post_by_slug(&slug)? {
        Some(post) if post.published => Ok(Json(post)),
        _ => Err(AppError::NotFound(format!("post '{}'", slug))),
    }
}

pub async fn list_tags(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Tag>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_tags()?))
}

// ========== Events & schedule ==========

pub async fn list_events(State(state): State<Arc<AppState>>, Query(params): Query<EventParams>) -> ApiResult<Vec<Event>> {
    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT).clamp(1, MAX_EVENT_LIMIT);
    let store = state.store.lock().await;
    Ok(Json(store.list_events(limit)?))
}

pub async fn get_event(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Event> {
    let store = state.store.lock().await;
    let event = store
        .get_event(id)?
        .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;
    Ok(Json(event))
}

pub async fn list_schedules(State(state): State<Arc<AppState>>) -> ApiResult<Vec<WeeklySchedule>> {
    let store = state.store.lock().await;
    Ok(Json(store.list_schedules()?))
}

// ========== Admin ==========

pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<WeeklySchedule>,
) -> Result<(StatusCode, Json<WeeklySchedule>), AppError> {
    let store = state.store.lock().await;
    let created = store.insert_schedule(&entry)?;
    tracing::info!("Created weekly schedule entry {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(entry): Json<WeeklySchedule>,
) -> ApiResult<WeeklySchedule> {
    let entry = WeeklySchedule { id, ..entry };
    let store = state.store.lock().await;
    if !store.update_schedule(&entry)? {
        return Err(AppError::NotFound(format!("weekly schedule {}", id)));
    }
    Ok(Json(entry))
}

pub async fn delete_schedule(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    let store = state.store.lock().await;
    if !store.delete_schedule(id)? {
        return Err(AppError::NotFound(format!("weekly schedule {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_event(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    let store = state.store.lock().await;
    if !store.delete_event(id)? {
        return Err(AppError::NotFound(format!("event {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import(State(state): State<Arc<AppState>>, Json(bundle): Json<ImportBundle>) -> ApiResult<ImportReport> {
    let mut store = state.store.lock().await;
    let report = run_import(&mut store, &bundle)?;
    Ok(Json(report))
}

pub async fn list_local_media(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MediaParams>,
) -> ApiResult<MediaListing> {
    let root = state.config.media_root_path();
    let listing = list_media(&root, params.path.as_deref().unwrap_or(""))?;
    Ok(Json(listing))
}

// ========== Cron ==========

pub async fn sync_events(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<SyncReport> {
    auth::authorize_cron(&headers, state.config.cron_secret.as_deref())?;
    let opts = SyncOptions::from(&state.config.sync);
    let report = run_sync(&state.store, state.fetcher.as_ref(), state.translator.as_ref(), &opts).await?;
    Ok(Json(report))
}
