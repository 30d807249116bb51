//! Local verification backend for end-to-end tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use lopdf::{dictionary, Document, Object, Stream};

use cert_verify::ViewerConfig;

pub const ENDPOINT_PATH: &str = "/obtenerCertificacionPDF";

/// One received request: the `cod` field and the Accept header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub code: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone, Default)]
struct BackendState {
    hits: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
}

pub struct Backend {
    pub base: String,
    state: BackendState,
}

impl Backend {
    /// Start a backend on an ephemeral port
    pub async fn start() -> Self {
        let state = BackendState::default();
        let app = Router::new()
            .route(ENDPOINT_PATH, post(certificate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn config(&self) -> ViewerConfig {
        ViewerConfig {
            api_base: self.base.clone(),
            ..Default::default()
        }
    }
}

/// Codes select the backend's behaviour
async fn certificate(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let code = form.get("cod").cloned();
    state.received.lock().unwrap().push(Received {
        code: code.clone(),
        accept: headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match code.as_deref().unwrap_or_default() {
        "demo123" => pdf_response(pdf_with_pages(1)),
        "multi" => pdf_response(pdf_with_pages(3)),
        "charset" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "Application/PDF; charset=binary")],
            pdf_with_pages(1),
        )
            .into_response(),
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "forbidden" => StatusCode::FORBIDDEN.into_response(),
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "stack trace").into_response(),
        "expired" => (StatusCode::BAD_REQUEST, "Código expirado").into_response(),
        "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
        "html" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            "<html>login</html>",
        )
            .into_response(),
        "empty" => pdf_response(Vec::new()),
        "corrupt" => pdf_response(b"this is not a document at all".to_vec()),
        "nopages" => pdf_response(pdf_with_pages(0)),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            pdf_response(pdf_with_pages(1))
        }
        "slowish" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            pdf_response(pdf_with_pages(3))
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn pdf_response(body: Vec<u8>) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/pdf")], body).into_response()
}

/// A PDF with `count` blank 200×300 pt pages
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count as i64,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(200),
            Object::Integer(300),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// An address nothing listens on
pub fn closed_port_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
