use axum::Router;
use std::net::SocketAddr;
use std::path::Path;

/// Serve `app` on a random local port, returning its base URL
#[allow(dead_code)]
pub async fn start_mock_server(app: Router) -> String {
    start_mock_server_with(|_| app).await
}

/// Like [`start_mock_server`], for routers that need their own base URL
pub async fn start_mock_server_with(build: impl FnOnce(&str) -> Router) -> String {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind mock server");
    let bound_addr = listener.local_addr().expect("Failed to read bound address");
    let base = format!("http://{}", bound_addr);
    let app = build(&base);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base
}

/// Write `<name>.toml` into the plugin directory
#[allow(dead_code)]
pub fn write_plugin(dir: &Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{}.toml", name)), contents).unwrap();
}
