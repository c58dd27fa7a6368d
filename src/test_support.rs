//! 테스트용 in-process mock 서버

use axum::{http::StatusCode, Router};
use tokio::task::JoinHandle;

/// `127.0.0.1:0`에 바인드된 mock 서버
pub struct MockUpstream {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    /// 모든 요청에 주어진 status로 응답
    pub async fn status(status: StatusCode) -> Self {
        spawn_mock(Router::new().fallback(move || async move { status })).await
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_mock(app: Router) -> MockUpstream {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        base_url: format!("http://{}", addr),
        handle,
    }
}
