use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::WikiConfig;
use crate::storage::WikiStore;
use crate::sync::{build_translator, FeedFetcher, HttpFetcher, Translator};

pub mod auth;
pub mod error;
pub mod routes;

/// Server state
pub struct AppState {
    pub store: Mutex<WikiStore>,
    pub config: WikiConfig,
    pub fetcher: Arc<dyn FeedFetcher>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    /// State with the HTTP feed fetcher and the configured translator
    pub fn new(store: WikiStore, config: WikiConfig) -> crate::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        let translator = build_translator(&config.sync.translate)?;
        Ok(Self::with_clients(store, config, fetcher, translator))
    }

    pub fn with_clients(
        store: WikiStore,
        config: WikiConfig,
        fetcher: Arc<dyn FeedFetcher>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            config,
            fetcher,
            translator,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route(
            "/api/admin/weekly-schedules",
            get(routes::list_schedules).post(routes::create_schedule),
        )
        .route(
            "/api/admin/weekly-schedules/{id}",
            put(routes::update_schedule).delete(routes::delete_schedule),
        )
        .route("/api/admin/events/{id}", delete(routes::delete_event))
        .route("/api/admin/import", post(routes::import))
        .route("/api/local-media/list", get(routes::list_local_media))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    let media = ServeDir::new(state.config.media_root_path());

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/classes", get(routes::list_classes))
        .route("/api/classes/{slug}", get(routes::get_class))
        .route("/api/classes/{slug}/talent-grid", get(routes::get_talent_grid))
        .route("/api/skills/{slug}", get(routes::get_skill))
        .route("/api/items", get(routes::list_items))
        .route("/api/items/{slug}", get(routes::get_item))
        .route("/api/posts", get(routes::list_posts))
        .route("/api/posts/{slug}", get(routes::get_post))
        .route("/api/tags", get(routes::list_tags))
        .route("/api/events", get(routes::list_events))
        .route("/api/events/{id}", get(routes::get_event))
        .route("/api/weekly-schedules", get(routes::list_schedules))
        .route("/api/cron/sync-events", get(routes::sync_events).post(routes::sync_events))
        .merge(admin)
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(store: WikiStore, config: WikiConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    if config.cron_secret.is_none() {
        tracing::warn!("No cron secret configured; /api/cron/sync-events is disabled");
    }
    if config.admin_token.is_none() {
        tracing::warn!("No admin token configured; admin endpoints are open");
    }

    let state = Arc::new(AppState::new(store, config)?);
    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Faction, GameClass, Post, Skill, Talent, WeeklySchedule};
    use crate::sync::NoopTranslator;
    use crate::talent_grid::TalentTree;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    struct StaticFetcher;

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> crate::Result<String> {
            Ok(r#"<rss><channel>
                <item><guid>n1</guid><title>Patch</title><description>Notes</description></item>
            </channel></rss>"#
                .to_string())
        }
    }

    fn seeded_store() -> WikiStore {
        let store = WikiStore::open_in_memory().unwrap();
        let class_id = store.upsert_class(&GameClass::new("warden", "Warden", Faction::Chosen)).unwrap();
        let skill = Skill::new("eagle-eye", "Eagle Eye", "+{acc}% accuracy", 2)
            .with_value(1, "acc", 5.0)
            .with_value(2, "acc", 10.0)
            .with_value(1, "acc_pvp", 3.0)
            .with_value(2, "acc_pvp", 6.0);
        let skill_id = store.upsert_skill(&skill).unwrap();
        store.link_class_skill(class_id, skill_id).unwrap();
        let talent_id = store.upsert_talent(&Talent::new(class_id, "Sharp Eye", "", 1)).unwrap();
        store
            .set_talent_tree(class_id, &TalentTree::new().with_talent(0, 0, talent_id))
            .unwrap();
        store.upsert_post(&Post::new("guide", "Guide", "<p>Hi</p>").published()).unwrap();
        store.upsert_post(&Post::new("draft", "Draft", "")).unwrap();
        store
    }

    fn app_with(config: WikiConfig) -> Router {
        let state = AppState::with_clients(seeded_store(), config, Arc::new(StaticFetcher), Arc::new(NoopTranslator));
        build_router(Arc::new(state))
    }

    fn app() -> Router {
        app_with(WikiConfig {
            cron_secret: Some("cron-secret".to_string()),
            admin_token: Some("admin-token".to_string()),
            ..WikiConfig::default()
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_class_detail_formats_descriptions() {
        let app = app();
        let (status, body) = send(&app, get("/api/classes/warden")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "warden");
        assert_eq!(body["skills"][0]["formatted_description"]["plain"], "+5/10 (3/6)% accuracy");
        assert_eq!(body["talents"][0]["name"], "Sharp Eye");

        let (status, body) = send(&app, get("/api/classes/nobody")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_skill_lists_classes() {
        let (status, body) = send(&app(), get("/api/skills/eagle-eye")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["classes"][0], "warden");
        assert_eq!(body["formatted_description"]["has_pvp"], true);
    }

    #[tokio::test]
    async fn test_talent_grid_json_and_html() {
        let app = app();
        let (status, body) = send(&app, get("/api/classes/warden/talent-grid")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], 17);
        assert_eq!(body["grid"]["rows"][0][0]["type"], "talent");
        assert_eq!(body["grid"]["rows"][0][1]["type"], "empty");

        let response = app.clone().oneshot(get("/api/classes/warden/talent-grid?format=html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.starts_with(r#"<table class="talent-grid">"#));
        assert!(html.contains(r#"title="Sharp Eye""#));
    }

    #[tokio::test]
    async fn test_posts_only_published() {
        let app = app();
        let (_, body) = send(&app, get("/api/posts")).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (status, _) = send(&app, get("/api/posts/draft")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get("/api/posts?kind=poem")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_schedule_crud() {
        let app = app();
        let entry = serde_json::to_value(WeeklySchedule::new("Arena", 2, "19:00")).unwrap();

        let (status, _) = send(&app, json_request("POST", "/api/admin/weekly-schedules", None, entry.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) =
            send(&app, json_request("POST", "/api/admin/weekly-schedules", Some("wrong"), entry.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) =
            send(&app, json_request("POST", "/api/admin/weekly-schedules", Some("admin-token"), entry.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, _) =
            send(&app, json_request("PUT", "/api/admin/weekly-schedules/9999", Some("admin-token"), entry.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let bad = serde_json::to_value(WeeklySchedule::new("Arena", 9, "19:00")).unwrap();
        let uri = format!("/api/admin/weekly-schedules/{}", id);
        let (status, body) = send(&app, json_request("PUT", &uri, Some("admin-token"), bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (_, public) = send(&app, get("/api/weekly-schedules")).await;
        assert_eq!(public.as_array().unwrap().len(), 1);

        let delete = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, "Bearer admin-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_admin_open_without_token() {
        let app = app_with(WikiConfig::default());
        let (status, _) = send(&app, get("/api/admin/weekly-schedules")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_import() {
        let app = app();
        let bundle = serde_json::json!({
            "classes": [{"slug": "ranger", "name": "Ranger", "faction": "chosen"}],
            "skills": [{"slug": "volley", "name": "Volley", "classes": ["ranger"]}]
        });
        let (status, report) = send(&app, json_request("POST", "/api/admin/import", Some("admin-token"), bundle)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["skills"], 1);

        let bad = serde_json::json!({"skills": [{"slug": "x", "name": "X", "classes": ["ghost"]}]});
        let (status, body) = send(&app, json_request("POST", "/api/admin/import", Some("admin-token"), bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "skills[0]: unknown class 'ghost'");
    }

    #[tokio::test]
    async fn test_cron_sync_requires_secret() {
        let app = app_with(WikiConfig {
            cron_secret: Some("cron-secret".to_string()),
            sync: crate::config::SyncConfig {
                feed_url: "https://example.com/rss".to_string(),
                ..Default::default()
            },
            ..WikiConfig::default()
        });

        let (status, _) = send(&app, get("/api/cron/sync-events")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, report) =
            send(&app, json_request("POST", "/api/cron/sync-events", Some("cron-secret"), Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["inserted"], 1);

        let (status, report) =
            send(&app, json_request("POST", "/api/cron/sync-events", Some("cron-secret"), Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["skipped_existing"], 1);

        let (_, events) = send(&app, get("/api/events")).await;
        assert_eq!(events[0]["external_id"], "n1");
    }

    #[tokio::test]
    async fn test_cron_disabled_without_secret() {
        let app = app_with(WikiConfig::default());
        let (status, body) = send(&app, json_request("GET", "/api/cron/sync-events", Some("x"), Value::Null)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_local_media_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let app = app_with(WikiConfig {
            media_root: dir.path().to_string_lossy().to_string(),
            ..WikiConfig::default()
        });

        let (status, body) = send(&app, get("/api/local-media/list")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"][0]["name"], "a.png");

        let (status, _) = send(&app, get("/api/local-media/list?path=../")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(get("/media/a.png")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
