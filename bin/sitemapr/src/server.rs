//! HTTP endpoints serving the sitemap index and class pages

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use sitemapr_generator::{Sitemap, render::CONTENT_TYPE};
use tower_http::trace::TraceLayer;

/// Optional `?page=N` on class pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

/// Create the sitemap router.
pub fn create_router(sitemap: Arc<Sitemap>) -> Router {
    Router::new()
        .route("/sitemap.xml", get(index_handler))
        .route("/sitemap.xml/sitemap/{class}", get(class_handler))
        .route("/sitemap.xml/sitemap/{class}/", get(class_handler))
        .route("/sitemap.xml/sitemap/{class}/{page}", get(class_page_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(sitemap)
}

async fn index_handler(State(sitemap): State<Arc<Sitemap>>) -> Response {
    render_blocking(sitemap, |sitemap| sitemap.render_index()).await
}

async fn class_handler(
    State(sitemap): State<Arc<Sitemap>>,
    Path(class): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = match query.page.as_deref() {
        None | Some("") => Some(1),
        Some(raw) => parse_page(raw),
    };
    class_page(sitemap, class, page).await
}

async fn class_page_handler(
    State(sitemap): State<Arc<Sitemap>>,
    Path((class, page)): Path<(String, String)>,
) -> Response {
    class_page(sitemap, class, parse_page(&page)).await
}

async fn class_page(sitemap: Arc<Sitemap>, class: String, page: Option<usize>) -> Response {
    let Some(page) = page else {
        return StatusCode::NOT_FOUND.into_response();
    };
    render_blocking(sitemap, move |sitemap| sitemap.render_page(&class, page)).await
}

/// Repository reads are synchronous; run them off the async workers.
async fn render_blocking<F>(sitemap: Arc<Sitemap>, render: F) -> Response
where
    F: FnOnce(&Sitemap) -> sitemapr_generator::Result<Option<String>> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || render(&sitemap)).await {
        Ok(result) => to_response(result),
        Err(e) => {
            tracing::error!(error = %e, "Sitemap task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Page numbers are positive integers; anything else finds nothing.
fn parse_page(raw: &str) -> Option<usize> {
    raw.trim().parse().ok().filter(|page| *page > 0)
}

fn to_response(result: sitemapr_generator::Result<Option<String>>) -> Response {
    match result {
        Ok(Some(xml)) => (
            [
                (header::CONTENT_TYPE, CONTENT_TYPE),
                (HeaderName::from_static("x-robots-tag"), "noindex"),
            ],
            xml,
        )
            .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build sitemap");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
            mpsc,
        },
        time::Duration as StdDuration,
    };

    use axum::{body::Body, http::Request};
    use chrono::{Duration, Utc};
    use tokio::sync::oneshot;
    use sitemapr_core::{Config, CoreError, InMemoryRepository, Record, RecordQuery, RecordRepository};
    use sitemapr_generator::RegistrationOptions;
    use tower::ServiceExt;

    use super::*;

    fn blog_posts(count: usize) -> Vec<Record> {
        (1..=count as u64)
            .map(|id| {
                Record::new("BlogPost", id, Utc::now() - Duration::minutes(id as i64))
                    .with_link(format!("/blog/post-{id}/"))
            })
            .collect()
    }

    fn sitemap_with(records: Vec<Record>) -> Arc<Sitemap> {
        let mut config = Config::for_site("http://site.example");
        config.sitemap.include_site_tree = false;

        let mut repository = InMemoryRepository::new(records);
        repository.declare_class("Event");

        let sitemap = Sitemap::from_config(&config, Arc::new(repository)).unwrap();
        sitemap.register("BlogPost", RegistrationOptions::default()).unwrap();
        sitemap.register("Event", RegistrationOptions::default()).unwrap();
        Arc::new(sitemap)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_lists_non_empty_classes() {
        let router = create_router(sitemap_with(blog_posts(1500)));
        let (status, headers, body) = get(router, "/sitemap.xml").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], r#"application/xml; charset="utf-8""#);
        assert_eq!(headers["x-robots-tag"], "noindex");
        assert!(body.contains("<loc>http://site.example/sitemap.xml/sitemap/BlogPost/</loc>"));
        assert!(body.contains("<loc>http://site.example/sitemap.xml/sitemap/BlogPost/2</loc>"));
        assert!(!body.contains("Event"));
    }

    #[tokio::test]
    async fn test_empty_index_is_not_found() {
        let router = create_router(sitemap_with(Vec::new()));
        let (status, _, body) = get(router, "/sitemap.xml").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_class_page_routes() {
        let sitemap = sitemap_with(blog_posts(1500));

        for uri in [
            "/sitemap.xml/sitemap/BlogPost",
            "/sitemap.xml/sitemap/BlogPost/",
            "/sitemap.xml/sitemap/BlogPost/1",
            "/sitemap.xml/sitemap/BlogPost/?page=1",
        ] {
            let (status, headers, body) = get(create_router(Arc::clone(&sitemap)), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(headers["x-robots-tag"], "noindex");
            assert_eq!(body.matches("<url>").count(), 1000, "{uri}");
            assert!(body.contains("<loc>http://site.example/blog/post-1/</loc>"));
        }

        for uri in ["/sitemap.xml/sitemap/BlogPost/2", "/sitemap.xml/sitemap/BlogPost?page=2"] {
            let (status, _, body) = get(create_router(Arc::clone(&sitemap)), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body.matches("<url>").count(), 500, "{uri}");
            assert!(body.contains("<loc>http://site.example/blog/post-1001/</loc>"));
        }
    }

    #[tokio::test]
    async fn test_missing_pages_are_not_found() {
        let sitemap = sitemap_with(blog_posts(10));

        for uri in [
            "/sitemap.xml/sitemap/Event/",
            "/sitemap.xml/sitemap/Unknown/",
            "/sitemap.xml/sitemap/BlogPost/2",
            "/sitemap.xml/sitemap/BlogPost/0",
            "/sitemap.xml/sitemap/BlogPost/abc",
            "/sitemap.xml/sitemap/BlogPost/?page=x",
        ] {
            let (status, _, body) = get(create_router(Arc::clone(&sitemap)), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.is_empty(), "{uri}");
        }
    }

    struct FailingRepository;

    impl RecordRepository for FailingRepository {
        fn class_exists(&self, _class_id: &str) -> bool {
            true
        }

        fn fetch(&self, _query: &RecordQuery) -> sitemapr_core::Result<Vec<Record>> {
            Err(CoreError::query("backend unavailable"))
        }
    }

    #[tokio::test]
    async fn test_repository_failure_is_server_error() {
        let config = Config::for_site("http://site.example");
        let sitemap = Sitemap::from_config(&config, Arc::new(FailingRepository)).unwrap();
        let router = create_router(Arc::new(sitemap));

        let (status, _, _) = get(router, "/sitemap.xml").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Holds `Slow` reads until released, recording whether the release came.
    struct GatedRepository {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
        released: Arc<AtomicBool>,
    }

    impl RecordRepository for GatedRepository {
        fn class_exists(&self, _class_id: &str) -> bool {
            true
        }

        fn fetch(&self, query: &RecordQuery) -> sitemapr_core::Result<Vec<Record>> {
            if query.class_id == "Slow" {
                if let Some(started) = self.started.lock().unwrap().take() {
                    let _ = started.send(());
                }
                let released = self
                    .release
                    .lock()
                    .unwrap()
                    .recv_timeout(StdDuration::from_secs(5))
                    .is_ok();
                self.released.store(released, Ordering::SeqCst);
            }
            let link = format!("/{}/", query.class_id.to_lowercase());
            Ok(vec![Record::new(query.class_id.clone(), 1, Utc::now()).with_link(link)])
        }
    }

    #[tokio::test]
    async fn test_slow_read_does_not_stall_other_requests() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let released = Arc::new(AtomicBool::new(false));
        let repository = GatedRepository {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(release_rx),
            released: Arc::clone(&released),
        };

        let mut config = Config::for_site("http://site.example");
        config.sitemap.include_site_tree = false;
        let sitemap = Sitemap::from_config(&config, Arc::new(repository)).unwrap();
        sitemap.register("Fast", RegistrationOptions::default()).unwrap();
        sitemap.register("Slow", RegistrationOptions::default()).unwrap();
        let sitemap = Arc::new(sitemap);

        let slow_router = create_router(Arc::clone(&sitemap));
        let slow = tokio::spawn(async move { get(slow_router, "/sitemap.xml/sitemap/Slow/").await });
        started_rx.await.unwrap();

        let (status, _, body) = get(create_router(Arc::clone(&sitemap)), "/sitemap.xml/sitemap/Fast/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<loc>http://site.example/fast/</loc>"));

        release_tx.send(()).unwrap();
        let (status, _, body) = slow.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<loc>http://site.example/slow/</loc>"));
        assert!(released.load(Ordering::SeqCst));
    }
}
