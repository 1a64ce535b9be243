use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use facecheck_core::shared::photo::Photo;
use facecheck_core::submission::domain::student_backend::{
    BackendConfig, CompareRequest, RegisterRequest, StudentBackend, SubmitError,
};
use facecheck_core::submission::infrastructure::http_student_backend::HttpStudentBackend;

#[derive(Clone, Debug)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    received: Arc<Mutex<Vec<(String, Vec<ReceivedPart>)>>>,
}

async fn record(path: &str, state: &MockState, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.received.lock().unwrap().push((path.to_string(), parts));
    (
        state.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.body,
    )
        .into_response()
}

async fn compare(State(state): State<MockState>, multipart: Multipart) -> Response {
    record("/api/comparar_estudiante/", &state, multipart).await
}

async fn register(State(state): State<MockState>, multipart: Multipart) -> Response {
    record("/api/registrar_estudiante/", &state, multipart).await
}

/// Starts the mock backend on its own runtime thread and returns its address.
fn spawn_backend(status: StatusCode, body: &'static str) -> (SocketAddr, MockState) {
    let state = MockState {
        status,
        body,
        received: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/comparar_estudiante/", post(compare))
        .route("/api/registrar_estudiante/", post(register))
        .with_state(state.clone());

    let (addr_tx, addr_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            addr_tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    (addr_rx.recv().unwrap(), state)
}

fn backend(addr: SocketAddr) -> HttpStudentBackend {
    HttpStudentBackend::new(BackendConfig::new(format!("http://{addr}"))).unwrap()
}

fn jpeg_photo(name: &str) -> Photo {
    Photo::jpeg(name, vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 0xFF, 0xD9])
}

fn part<'a>(parts: &'a [ReceivedPart], name: &str) -> &'a ReceivedPart {
    parts
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("missing part {name}"))
}

#[test]
fn test_compare_posts_multipart_and_parses_result() {
    let (addr, state) = spawn_backend(StatusCode::OK, r#"{"es_similar": true}"#);

    let response = backend(addr)
        .compare(&CompareRequest {
            student_id: "S123".into(),
            photo: jpeg_photo("comparacion_S123.jpg"),
        })
        .unwrap();

    assert!(response.es_similar);
    let received = state.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (path, parts) = &received[0];
    assert_eq!(path, "/api/comparar_estudiante/");
    assert_eq!(parts.len(), 2);
    assert_eq!(part(parts, "estudiante_id").bytes, b"S123");
    let foto = part(parts, "foto");
    assert_eq!(foto.file_name.as_deref(), Some("comparacion_S123.jpg"));
    assert_eq!(foto.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(foto.bytes, jpeg_photo("x").bytes);
}

#[test]
fn test_register_posts_all_fields_and_unmodified_file() {
    let (addr, state) = spawn_backend(StatusCode::OK, r#"{"status": "success"}"#);
    let file = Photo {
        file_name: "retrato.png".into(),
        mime: "image/png".into(),
        bytes: vec![0x89, b'P', b'N', b'G', 9, 9, 9],
    };

    let response = backend(addr)
        .register(&RegisterRequest {
            nombre: "Ana".into(),
            apellido: "Pérez".into(),
            correo: "ana@uni.edu".into(),
            numero_matricula: "2024-001".into(),
            photo: file.clone(),
        })
        .unwrap();

    assert!(response.is_success());
    let received = state.received.lock().unwrap();
    let (path, parts) = &received[0];
    assert_eq!(path, "/api/registrar_estudiante/");
    assert_eq!(part(parts, "nombre").bytes, "Ana".as_bytes());
    assert_eq!(part(parts, "apellido").bytes, "Pérez".as_bytes());
    assert_eq!(part(parts, "correo").bytes, b"ana@uni.edu");
    assert_eq!(part(parts, "numero_matricula").bytes, b"2024-001");
    let foto = part(parts, "foto");
    assert_eq!(foto.file_name.as_deref(), Some("retrato.png"));
    assert_eq!(foto.content_type.as_deref(), Some("image/png"));
    assert_eq!(foto.bytes, file.bytes);
}

#[test]
fn test_server_error_carries_message() {
    let (addr, state) = spawn_backend(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message": "x"}"#);

    let err = backend(addr)
        .compare(&CompareRequest {
            student_id: "S123".into(),
            photo: jpeg_photo("comparacion_S123.jpg"),
        })
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Rejected {
            status: 500,
            message: "x".into()
        }
    );
    // One request, no retry.
    assert_eq!(state.received.lock().unwrap().len(), 1);
}

#[test]
fn test_success_with_unexpected_body_is_decode_error() {
    let (addr, _state) = spawn_backend(StatusCode::OK, r#"{"resultado": "ok"}"#);

    let err = backend(addr)
        .compare(&CompareRequest {
            student_id: "S1".into(),
            photo: jpeg_photo("comparacion_S1.jpg"),
        })
        .unwrap_err();

    assert!(matches!(err, SubmitError::Decode(_)));
}

#[test]
fn test_register_non_success_status_is_returned() {
    let (addr, _state) = spawn_backend(
        StatusCode::OK,
        r#"{"status": "error", "message": "Matrícula duplicada"}"#,
    );

    let response = backend(addr)
        .register(&RegisterRequest {
            nombre: "Ana".into(),
            apellido: "Pérez".into(),
            correo: "ana@uni.edu".into(),
            numero_matricula: "2024-001".into(),
            photo: jpeg_photo("Ana_Pérez.jpg"),
        })
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.message.as_deref(), Some("Matrícula duplicada"));
}
