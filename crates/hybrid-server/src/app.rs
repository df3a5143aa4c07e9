use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use hybrid_router::{
    Config, InstanceKey, InstanceStore, LogicalTarget, MemoryInstanceStore, MountCodec, MountTable,
    RenderDecision, RouteRequest, ViewClass, ViewParameters,
};
use serde_json::{json, Value as JsonValue};

use crate::response::{AppError, RedirectResponse};
use crate::views::ViewCatalog;

/// Header marking a listener/interface callback rather than navigation
pub const LISTENER_HEADER: &str = "hx-request";

/// Query parameter naming the scope explicitly
pub const SCOPE_PARAMETER: &str = "scope";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    table: Arc<MountTable>,
    store: MemoryInstanceStore,
    views: Arc<ViewCatalog>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let table = MountTable::from_config(config).context("Failed to build mount table")?;
        Ok(Self {
            table: Arc::new(table),
            store: MemoryInstanceStore::new(),
            views: Arc::new(ViewCatalog::from_config(config)),
        })
    }

    pub fn table(&self) -> &MountTable {
        &self.table
    }

    pub fn store(&self) -> &MemoryInstanceStore {
        &self.store
    }
}

/// Every path goes through the mount table
pub fn build_app(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let path = uri.path();
    let listener = headers.contains_key(LISTENER_HEADER);

    let mut query: ViewParameters = query.into_iter().collect();
    let scope = query
        .remove(SCOPE_PARAMETER)
        .and_then(|values| values.into_iter().next());

    let mut request = RouteRequest::new(path)
        .with_query(query)
        .from_listener(listener);
    if let Some(scope) = scope {
        request = request.with_scope(scope);
    }

    let codec = state.table.resolve(path)?;
    let target = codec.decode(&request, &state.store)?;

    match &target {
        LogicalTarget::Fresh {
            view_class,
            parameters,
            scope_name,
        } => {
            // Stateless views are rendered straight from the URL and never stored
            if !state.views.is_stateful(view_class) {
                let url = codec.encode(&target, &state.store)?;
                return Ok(render(view_class, parameters, None, url));
            }

            let instance = state
                .store
                .create(view_class.clone(), scope_name.clone(), true);

            let decision = codec.redirect_policy().on_instance_created(
                codec,
                path,
                &target,
                &instance,
                &state.store,
            )?;
            match decision {
                RenderDecision::Redirect(url) => Ok(RedirectResponse::to(url).into_response()),
                RenderDecision::RenderInPlace => {
                    let url = codec.encode(&target, &state.store)?;
                    render_instance(&state.store, &instance, url)
                }
            }
        }
        LogicalTarget::Resumed {
            instance_id,
            revision,
            scope_name,
            ..
        } => {
            let mut instance = InstanceKey {
                scope_name: scope_name.clone(),
                id: *instance_id,
                revision: *revision,
            };
            if listener {
                instance = state
                    .store
                    .advance_revision(&instance)
                    .context("Instance vanished during callback")?;
            }
            let url = codec.encode(&codec.resumed_target(&instance, &state.store), &state.store)?;
            render_instance(&state.store, &instance, url)
        }
        LogicalTarget::ExpiredInstance {
            scope_name,
            view_class,
        } => {
            let body = json!({
                "expired": true,
                "view": view_class,
                "scope": scope_name,
            });
            Ok((StatusCode::GONE, Json(body)).into_response())
        }
    }
}

/// JSON description of the view being shown
fn render(
    view: &ViewClass,
    parameters: &ViewParameters,
    instance: Option<&InstanceKey>,
    url: String,
) -> Response {
    let parameters: serde_json::Map<String, JsonValue> = parameters
        .iter()
        .map(|(name, values)| (name.to_string(), json!(values)))
        .collect();

    let body = json!({
        "view": view,
        "instance": instance.map(|key| key.id),
        "revision": instance.map(|key| key.revision),
        "scope": instance.and_then(|key| key.scope_name.as_deref()),
        "stateful": instance.is_some(),
        "parameters": parameters,
        "url": url,
    });
    Json(body).into_response()
}

fn render_instance(
    store: &MemoryInstanceStore,
    instance: &InstanceKey,
    url: String,
) -> Result<Response, AppError> {
    let view = store
        .view_class_of(instance)
        .context("Rendered instance has no view class")?;
    let parameters = store.recorded_parameters_of(instance);
    Ok(render(&view, &parameters, Some(instance), url))
}

/// One-line description of a mount for startup logs
pub fn describe_mount(codec: &MountCodec) -> String {
    format!("{} -> {}", codec.mount().path(), codec.mount().view_class())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::demo_mounts;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config {
            mounts: demo_mounts(),
            ..Config::default()
        };
        AppState::from_config(&config).unwrap()
    }

    fn test_app() -> Router {
        build_app(test_state())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn callback(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(LISTENER_HEADER, "true")
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> JsonValue {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_stateful_hit_redirects() {
        let app = test_app();

        let response = app.oneshot(get("/counter/start/5")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/counter/start/5.1");
    }

    #[tokio::test]
    async fn test_redirect_target_resumes_instance() {
        let app = test_app();

        let response = app.clone().oneshot(get("/counter/start/5/")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/counter/start/5/.1");

        let response = app.oneshot(get("/counter/start/5/.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["view"], "counter");
        assert_eq!(body["instance"], 1);
        assert_eq!(body["parameters"]["start"], json!(["5"]));
        assert_eq!(body["url"], "/counter/start/5/.1");
    }

    #[tokio::test]
    async fn test_listener_callback_advances_revision() {
        let app = test_app();
        app.clone().oneshot(get("/counter")).await.unwrap();

        let response = app.oneshot(callback("/counter.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["revision"], 1);
        assert_eq!(body["url"], "/counter.1.1");
    }

    #[tokio::test]
    async fn test_stateless_view_renders_in_place() {
        let app = test_app();

        let response = app.oneshot(get("/about?lang=en")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["stateful"], false);
        assert_eq!(body["url"], "/about/lang/en");
    }

    #[tokio::test]
    async fn test_stateless_views_are_not_stored() {
        let state = test_state();
        let store = state.store().clone();
        let app = build_app(state);

        for uri in ["/about", "/about/lang/en", "/about?lang=fr"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_body(response).await;
            assert_eq!(body["instance"], JsonValue::Null);
        }
        assert!(store.is_empty());

        app.oneshot(get("/counter")).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_scope_parameter_reaches_instance() {
        let app = test_app();

        let response = app.oneshot(get("/counter?scope=side")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/counter.side.1");
    }

    #[tokio::test]
    async fn test_expired_callback_is_gone() {
        let app = test_app();

        let response = app.oneshot(callback("/counter.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_navigation_to_missing_instance_starts_over() {
        let app = test_app();

        let response = app.oneshot(get("/counter.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/counter.1");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let app = test_app();

        let response = app.oneshot(get("/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
