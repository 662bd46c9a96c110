use crate::{
    config::Config,
    error::{RelayError, Result},
    models::{ErrorBody, GenerateImageRequest},
    relay::RelayService,
};
use actix_cors::Cors;
use actix_web::{
    dev::ServiceResponse,
    http::{header, StatusCode},
    middleware::{self, ErrorHandlerResponse, ErrorHandlers},
    web, App, HttpResponse, HttpServer,
};
use std::io;

async fn generate_image(
    relay: web::Data<RelayService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let request = parse_request(&body)?;
    let response = relay.generate_image(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn health(relay: web::Data<RelayService>) -> HttpResponse {
    HttpResponse::Ok().json(relay.health_check())
}

/// The body is read as JSON whatever the content type says. Anything that
/// does not yield a string `prompt` is a validation failure.
fn parse_request(body: &[u8]) -> Result<GenerateImageRequest> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("Unreadable request body: {}", e);
        RelayError::ValidationError
    })
}

/// Oversized bodies are rejected before any handler runs; give them the same
/// `{error}` shape as every other failure.
fn payload_too_large<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, res) = res.into_parts();
    if let Some(e) = res.error() {
        log::warn!("Rejected request: {}", e);
    }

    let res = HttpResponse::build(res.status()).json(ErrorBody::new("Request body is too large"));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}

fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

/// Mounts the `/api` routes, restricted to a single cross-origin caller.
pub fn configure(
    cors_origin: String,
    max_body_bytes: usize,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api")
                .app_data(web::PayloadConfig::new(max_body_bytes))
                .wrap(
                    ErrorHandlers::new()
                        .handler(StatusCode::PAYLOAD_TOO_LARGE, payload_too_large),
                )
                .wrap(cors(&cors_origin))
                .route("/generate-image", web::post().to(generate_image))
                .route("/health", web::get().to(health)),
        );
    }
}

pub async fn run(config: Config) -> io::Result<()> {
    let relay = RelayService::from_config(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let relay = web::Data::new(relay);
    let cors_origin = config.cors_origin.clone();
    let max_body_bytes = config.max_body_bytes;

    HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .configure(configure(cors_origin.clone(), max_body_bytes))
    })
    .bind(config.bind_address())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_BODY_BYTES;
    use crate::huggingface::{ImageBackend, RetryPolicy};
    use crate::models::{ErrorBody, GenerateImageResponse, HealthResponse, UpstreamResponse};
    use crate::relay::tests::ScriptedBackend;
    use crate::relay::DATA_URI_PREFIX;
    use actix_web::test;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::sync::Arc;
    use std::time::Duration;

    const ORIGIN: &str = "http://localhost:3000";
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn relay_with(backend: Arc<ScriptedBackend>) -> RelayService {
        let retry = RetryPolicy::default()
            .with_max_wait(Duration::from_millis(20))
            .with_fallback_wait(Duration::from_millis(20));
        RelayService::new(Some(backend as Arc<dyn ImageBackend>), retry)
    }

    macro_rules! app {
        ($relay:expr) => {
            app!($relay, DEFAULT_MAX_BODY_BYTES)
        };
        ($relay:expr, $limit:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($relay))
                    .configure(configure(ORIGIN.to_string(), $limit)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_reports_token() {
        let app = app!(relay_with(ScriptedBackend::new(vec![])));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, HealthResponse::ok(true));

        let app = app!(RelayService::new(None, RetryPolicy::default()));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!({"status": "ok", "token_configured": false}));
    }

    #[actix_web::test]
    async fn test_generate_success() {
        let backend = ScriptedBackend::new(vec![Ok(UpstreamResponse::new(200, PNG.to_vec()))]);
        let app = app!(relay_with(backend.clone()));

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({"prompt": "a futuristic city at sunset"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["prompt"], "a futuristic city at sunset");
        let image_url = body["imageUrl"].as_str().unwrap();
        let encoded = image_url.strip_prefix(DATA_URI_PREFIX).unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), PNG);
    }

    #[actix_web::test]
    async fn test_generate_after_cold_start() {
        let backend = ScriptedBackend::new(vec![
            Ok(UpstreamResponse::new(503, br#"{"estimated_time":12.0}"#.to_vec())),
            Ok(UpstreamResponse::new(200, PNG.to_vec())),
        ]);
        let app = app!(relay_with(backend.clone()));

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({"prompt": "a koi pond"}))
            .to_request();
        let body: GenerateImageResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.prompt, "a koi pond");
        assert_eq!(backend.calls(), 2);
    }

    #[actix_web::test]
    async fn test_missing_prompt_is_400() {
        let app = app!(relay_with(ScriptedBackend::new(vec![])));

        for payload in ["", "{}", "not json", r#"{"prompt": 5}"#, r#"{"text": "a cat"}"#] {
            let req = test::TestRequest::post()
                .uri("/api/generate-image")
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {:?}", payload);

            let body: ErrorBody = test::read_body_json(resp).await;
            assert_eq!(body.error, "Prompt is required");
        }
    }

    #[actix_web::test]
    async fn test_long_prompt_is_accepted() {
        let backend = ScriptedBackend::new(vec![Ok(UpstreamResponse::new(200, PNG.to_vec()))]);
        let app = app!(relay_with(backend.clone()));
        let prompt = "a very detailed mural ".repeat(300 * 1024 / 22);

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({ "prompt": prompt }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: GenerateImageResponse = test::read_body_json(resp).await;
        assert_eq!(body.prompt.len(), prompt.len());
        assert_eq!(backend.seen.lock().unwrap()[0], prompt);
    }

    #[actix_web::test]
    async fn test_oversized_body_is_json_413() {
        let backend = ScriptedBackend::new(vec![]);
        let app = app!(relay_with(backend.clone()), 1024);

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .insert_header((header::ORIGIN, ORIGIN))
            .set_json(serde_json::json!({ "prompt": "x".repeat(4096) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(ORIGIN)
        );

        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Request body is too large");
        assert_eq!(backend.calls(), 0);
    }

    #[actix_web::test]
    async fn test_missing_token_is_500() {
        let app = app!(RelayService::new(None, RetryPolicy::default()));

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({"prompt": "a cat"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert!(body.error.starts_with("API token not configured"));
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_500_with_text() {
        let backend = ScriptedBackend::new(vec![Ok(UpstreamResponse::new(
            400,
            br#"{"error":"Authorization header is correct, but the token seems invalid"}"#.to_vec(),
        ))]);
        let app = app!(relay_with(backend));

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({"prompt": "a cat"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert!(body.error.starts_with("API Error: "));
        assert!(body.error.contains("the token seems invalid"));
    }

    #[actix_web::test]
    async fn test_network_failure_is_500() {
        let backend = ScriptedBackend::new(vec![Err(RelayError::NetworkError(
            "dns error".into(),
        ))]);
        let app = app!(relay_with(backend));

        let req = test::TestRequest::post()
            .uri("/api/generate-image")
            .set_json(serde_json::json!({"prompt": "a cat"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Failed to connect to image API: dns error");
    }

    #[actix_web::test]
    async fn test_cors_preflight_from_frontend() {
        let app = app!(relay_with(ScriptedBackend::new(vec![])));

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/generate-image")
            .insert_header((header::ORIGIN, ORIGIN))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(ORIGIN)
        );
    }

    #[actix_web::test]
    async fn test_cors_header_on_simple_request() {
        let app = app!(relay_with(ScriptedBackend::new(vec![])));

        let req = test::TestRequest::get()
            .uri("/api/health")
            .insert_header((header::ORIGIN, ORIGIN))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(ORIGIN)
        );
    }
}
