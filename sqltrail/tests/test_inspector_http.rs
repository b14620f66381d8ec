use sqltrail::{inspector, sql_args, Correlation, Profiler, ScopeLabels};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn spawn(app: axum::Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

fn traced_profiler() -> Profiler {
    let profiler = Profiler::default();
    let (handle, scope) =
        profiler.begin_scope(Some(&Correlation::root()), ScopeLabels::new("/users", "DELETE"));
    profiler.begin_operation(&handle, "DELETE FROM users WHERE id = ?", sql_args![9]).finish();
    scope.finish();
    profiler
}

#[tokio::test]
async fn test_page_over_http() {
    let addr = spawn(inspector::router(traced_profiler())).await;

    let response = get(addr, "/").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("text/html"));
    assert!(response.contains("DELETE FROM users WHERE id = 9"));
    assert!(response.contains("badge danger"));
}

#[tokio::test]
async fn test_raw_over_http() {
    let addr = spawn(inspector::router(traced_profiler())).await;

    let response = get(addr, "/raw").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("application/json"));

    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let doc: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(doc[0]["labels"]["method"], "DELETE");
}

#[tokio::test]
async fn test_raw_router_serves_document_at_root() {
    let addr = spawn(inspector::raw_router(traced_profiler())).await;

    let response = get(addr, "/").await;
    assert!(response.contains("application/json"));
    assert!(response.contains("\"statement\""));
}

#[tokio::test]
async fn test_static_assets() {
    let addr = spawn(inspector::router(Profiler::default())).await;

    let css = get(addr, "/static/style.css").await;
    assert!(css.starts_with("HTTP/1.1 200"));
    assert!(css.contains("text/css"));

    let missing = get(addr, "/static/missing.js").await;
    assert!(missing.starts_with("HTTP/1.1 404"));
}
