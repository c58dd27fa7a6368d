//! Feedback Client
//!
//! 외부 API Gateway의 `/feedback` 리소스 CRUD 클라이언트
//!
//! # Gateway Response
//!
//! Lambda proxy 응답은 `{ "statusCode": 200, "body": "<json string>" }` 형태로
//! 한 번 더 감싸져 올 수 있음. 경계에서 한 번만 검사해 `GatewayPayload`로 분류하고,
//! 이후 코드는 실제 payload만 다룸.
//!
//! 서버 바이너리는 이 클라이언트를 쓰지 않음. `FEEDBACK_API_URL`은
//! `FeedbackClient::from_config`를 통해서만 읽히는 라이브러리 전용 설정.
//!
//! # Local State
//!
//! `FeedbackBoard`는 원격 호출이 성공한 뒤에만 로컬 목록을 갱신 (optimistic reconcile).
//! 실패 시 목록은 그대로, 에러만 반환.

use chrono::Utc;
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::price_source::build_http_client;
use crate::config::Config;
use crate::error::FeedbackError;

/// 피드백 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub username: String,
    pub useremail: String,
    pub feedback_message: String,
    pub created_at: String,
}

/// `id`를 제외한 수정 가능 필드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFields {
    pub username: String,
    pub useremail: String,
    pub feedback_message: String,
    pub created_at: String,
}

impl Feedback {
    pub fn from_fields(id: &str, fields: FeedbackFields) -> Self {
        Self {
            id: id.to_string(),
            username: fields.username,
            useremail: fields.useremail,
            feedback_message: fields.feedback_message,
            created_at: fields.created_at,
        }
    }
}

/// 새 피드백 입력 (`createdAt`은 전송 시점에 채움)
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub username: String,
    pub useremail: String,
    pub feedback_message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    username: &'a str,
    useremail: &'a str,
    feedback_message: &'a str,
    created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id: &'a str,
    #[serde(flatten)]
    fields: &'a FeedbackFields,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id: &'a str,
    created_at: &'a str,
}

/// 목록 응답: 배열 또는 `{ count, items }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Items(Vec<Feedback>),
    Page {
        #[serde(default)]
        items: Vec<Feedback>,
    },
}

impl From<ListResponse> for Vec<Feedback> {
    fn from(response: ListResponse) -> Self {
        match response {
            ListResponse::Items(items) | ListResponse::Page { items } => items,
        }
    }
}

/// Gateway 응답 분류
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayPayload {
    /// 감싸지 않은 payload
    Raw(Value),
    /// `body` 필드로 감싼 payload (문자열 body는 이미 디코딩된 상태)
    Wrapped(Value),
}

impl GatewayPayload {
    /// 응답 body 텍스트를 한 번 검사해 분류
    ///
    /// JSON이 아니거나 문자열 `body`가 JSON이 아니면 응답 텍스트 전체를 `Raw` 문자열로 취급
    pub fn inspect(text: &str) -> Self {
        let raw_text = || GatewayPayload::Raw(Value::String(text.to_string()));

        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(mut map)) => match map.remove("body") {
                Some(Value::String(encoded)) => match serde_json::from_str(&encoded) {
                    Ok(body) => GatewayPayload::Wrapped(body),
                    Err(_) => raw_text(),
                },
                Some(body) => GatewayPayload::Wrapped(body),
                None => GatewayPayload::Raw(Value::Object(map)),
            },
            Ok(other) => GatewayPayload::Raw(other),
            Err(_) => raw_text(),
        }
    }

    /// 실제 payload
    pub fn into_value(self) -> Value {
        match self {
            GatewayPayload::Raw(value) | GatewayPayload::Wrapped(value) => value,
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, FeedbackError> {
        Ok(serde_json::from_value(self.into_value())?)
    }
}

/// Feedback REST 클라이언트
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedbackClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `FEEDBACK_API_URL`이 설정된 경우에만 생성
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        let Some(base_url) = config.feedback_api_url.as_deref() else {
            return Ok(None);
        };
        let http = build_http_client(config.upstream_timeout)?;
        Ok(Some(Self::with_client(http, base_url)))
    }

    /// GET /feedback
    pub async fn list(&self) -> Result<Vec<Feedback>, FeedbackError> {
        let payload = self.send::<()>(Method::GET, "/feedback", None).await?;
        let response: ListResponse = payload.decode()?;
        Ok(response.into())
    }

    /// POST /feedback
    pub async fn create(&self, input: &NewFeedback) -> Result<(), FeedbackError> {
        let body = CreateRequest {
            username: &input.username,
            useremail: &input.useremail,
            feedback_message: &input.feedback_message,
            created_at: Utc::now().timestamp_millis().to_string(),
        };
        self.send(Method::POST, "/feedback", Some(&body)).await?;
        Ok(())
    }

    /// PUT /feedback/{id}
    pub async fn update(&self, id: &str, fields: &FeedbackFields) -> Result<(), FeedbackError> {
        let body = UpdateRequest { id, fields };
        self.send(Method::PUT, &format!("/feedback/{}", id), Some(&body))
            .await?;
        Ok(())
    }

    /// DELETE /feedback/{id}
    pub async fn delete(&self, id: &str, created_at: &str) -> Result<(), FeedbackError> {
        let body = DeleteRequest { id, created_at };
        self.send(Method::DELETE, &format!("/feedback/{}", id), Some(&body))
            .await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<GatewayPayload, FeedbackError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "Feedback request");

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedbackError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(GatewayPayload::inspect(&text))
    }
}

/// 순서가 유지되는 로컬 피드백 목록
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackList {
    items: Vec<Feedback>,
}

impl FeedbackList {
    pub fn items(&self) -> &[Feedback] {
        &self.items
    }

    pub fn replace(&mut self, items: Vec<Feedback>) {
        self.items = items;
    }

    /// 같은 `id` 항목을 제자리에서 교체
    pub fn apply_update(&mut self, id: &str, fields: FeedbackFields) -> bool {
        match self.items.iter_mut().find(|f| f.id == id) {
            Some(item) => {
                *item = Feedback::from_fields(id, fields);
                true
            }
            None => false,
        }
    }

    pub fn apply_delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|f| f.id != id);
        self.items.len() != before
    }
}

/// 원격 호출 + 로컬 목록 동기화
#[derive(Debug, Clone)]
pub struct FeedbackBoard {
    client: FeedbackClient,
    list: FeedbackList,
}

impl FeedbackBoard {
    pub fn new(client: FeedbackClient) -> Self {
        Self {
            client,
            list: FeedbackList::default(),
        }
    }

    pub fn items(&self) -> &[Feedback] {
        self.list.items()
    }

    pub async fn refresh(&mut self) -> Result<(), FeedbackError> {
        let items = self.client.list().await?;
        self.list.replace(items);
        Ok(())
    }

    pub async fn submit(&self, input: &NewFeedback) -> Result<(), FeedbackError> {
        self.client.create(input).await
    }

    pub async fn update(&mut self, id: &str, fields: FeedbackFields) -> Result<(), FeedbackError> {
        self.client.update(id, &fields).await?;
        self.list.apply_update(id, fields);
        Ok(())
    }

    pub async fn delete(&mut self, id: &str, created_at: &str) -> Result<(), FeedbackError> {
        self.client.delete(id, created_at).await?;
        self.list.apply_delete(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_mock, MockUpstream};
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{delete, get, post, put},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    fn item(id: &str, message: &str) -> Feedback {
        Feedback {
            id: id.into(),
            username: "kim".into(),
            useremail: "kim@example.com".into(),
            feedback_message: message.into(),
            created_at: "1700000000000".into(),
        }
    }

    #[test]
    fn test_inspect_variants() {
        assert_eq!(
            GatewayPayload::inspect(r#"[{"a":1}]"#),
            GatewayPayload::Raw(json!([{"a": 1}]))
        );
        assert_eq!(
            GatewayPayload::inspect(r#"{"statusCode":200,"body":"[1,2]"}"#),
            GatewayPayload::Wrapped(json!([1, 2]))
        );
        assert_eq!(
            GatewayPayload::inspect(r#"{"statusCode":200,"body":{"x":1}}"#),
            GatewayPayload::Wrapped(json!({"x": 1}))
        );
        assert_eq!(
            GatewayPayload::inspect("plain text"),
            GatewayPayload::Raw(json!("plain text"))
        );
    }

    #[test]
    fn test_unparsable_inner_body_returns_whole_text() {
        let text = r#"{"statusCode":200,"body":"not json"}"#;
        assert_eq!(GatewayPayload::inspect(text), GatewayPayload::Raw(json!(text)));
        assert_eq!(GatewayPayload::inspect(text).into_value(), json!(text));

        // 이중 인코딩된 문자열 body는 한 번만 벗김
        let nested = r#"{"body":"\"[1]\""}"#;
        assert_eq!(GatewayPayload::inspect(nested).into_value(), json!("[1]"));
    }

    #[test]
    fn test_from_config_requires_url() {
        let unset = Config::from_lookup(|_| None).unwrap();
        assert!(FeedbackClient::from_config(&unset).unwrap().is_none());

        let set = Config::from_lookup(|key| {
            (key == "FEEDBACK_API_URL").then(|| "https://gw.example/prod/".to_string())
        })
        .unwrap();
        let client = FeedbackClient::from_config(&set).unwrap().unwrap();
        assert_eq!(client.base_url, "https://gw.example/prod");
    }

    #[test]
    fn test_feedback_wire_names() {
        let value = serde_json::to_value(item("1", "hi")).unwrap();
        assert_eq!(value["feedbackMessage"], "hi");
        assert_eq!(value["createdAt"], "1700000000000");
        assert_eq!(value["useremail"], "kim@example.com");
    }

    #[test]
    fn test_apply_update_keeps_order() {
        let mut list = FeedbackList::default();
        list.replace(vec![item("1", "a"), item("2", "b"), item("3", "c")]);

        let fields = FeedbackFields {
            username: "lee".into(),
            useremail: "lee@example.com".into(),
            feedback_message: "edited".into(),
            created_at: "1700000000000".into(),
        };
        assert!(list.apply_update("2", fields));
        assert!(!list.apply_update("9", FeedbackFields {
            username: String::new(),
            useremail: String::new(),
            feedback_message: String::new(),
            created_at: String::new(),
        }));

        let ids: Vec<_> = list.items().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(list.items()[1].feedback_message, "edited");
        assert_eq!(list.items()[1].username, "lee");
        assert_eq!(list.items()[0], item("1", "a"));
    }

    #[tokio::test]
    async fn test_list_wrapped_page() {
        let app = Router::new().route(
            "/feedback",
            get(|| async {
                let page = json!({ "count": 1, "items": [item("1", "hello")] });
                Json(json!({ "statusCode": 200, "body": page.to_string() }))
            }),
        );
        let gateway = spawn_mock(app).await;

        let items = assert_ok!(FeedbackClient::new(&gateway.base_url).list().await);
        assert_eq!(items, vec![item("1", "hello")]);
    }

    #[tokio::test]
    async fn test_update_reconciles_after_success() {
        let received = Arc::new(Mutex::new(None::<Value>));
        let sink = received.clone();
        let app = Router::new()
            .route(
                "/feedback",
                get(|| async { Json(json!([item("1", "a"), item("2", "b")])) }),
            )
            .route(
                "/feedback/:id",
                put(move |Path(id): Path<String>, Json(body): Json<Value>| {
                    let sink = sink.clone();
                    async move {
                        assert_eq!(body["id"], id);
                        *sink.lock().unwrap() = Some(body.clone());
                        Json(body)
                    }
                }),
            );
        let gateway = spawn_mock(app).await;

        let mut board = FeedbackBoard::new(FeedbackClient::new(&gateway.base_url));
        assert_ok!(board.refresh().await);

        let fields = FeedbackFields {
            username: "kim".into(),
            useremail: "kim@example.com".into(),
            feedback_message: "updated".into(),
            created_at: "1700000000000".into(),
        };
        assert_ok!(board.update("1", fields).await);

        assert_eq!(board.items().len(), 2);
        assert_eq!(board.items()[0].id, "1");
        assert_eq!(board.items()[0].feedback_message, "updated");
        assert_eq!(board.items()[1], item("2", "b"));

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body["feedbackMessage"], "updated");
        assert_eq!(body["createdAt"], "1700000000000");
    }

    #[tokio::test]
    async fn test_failure_leaves_list_untouched() {
        let gateway = MockUpstream::status(StatusCode::BAD_GATEWAY).await;
        let mut board = FeedbackBoard::new(FeedbackClient::new(&gateway.base_url));
        board.list.replace(vec![item("1", "a")]);

        let err = assert_err!(board.delete("1", "1700000000000").await);
        assert_eq!(err.to_string(), "Request failed with status 502");
        assert_eq!(board.items(), &[item("1", "a")]);
    }

    #[tokio::test]
    async fn test_list_page_without_items() {
        let app = Router::new().route("/feedback", get(|| async { Json(json!({ "count": 0 })) }));
        let gateway = spawn_mock(app).await;

        let items = assert_ok!(FeedbackClient::new(&gateway.base_url).list().await);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_submit_sends_create_body() {
        let received = Arc::new(Mutex::new(None::<(Option<String>, Value)>));
        let sink = received.clone();
        let app = Router::new().route(
            "/feedback",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *sink.lock().unwrap() = Some((content_type, body));
                    Json(json!({ "statusCode": 200, "body": "{\"ok\":true}" }))
                }
            }),
        );
        let gateway = spawn_mock(app).await;

        let before = Utc::now().timestamp_millis();
        let board = FeedbackBoard::new(FeedbackClient::new(&gateway.base_url));
        let input = NewFeedback {
            username: "kim".into(),
            useremail: "kim@example.com".into(),
            feedback_message: "great".into(),
        };
        assert_ok!(board.submit(&input).await);
        let after = Utc::now().timestamp_millis();

        let (content_type, body) = received.lock().unwrap().clone().unwrap();
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["username"], "kim");
        assert_eq!(body["useremail"], "kim@example.com");
        assert_eq!(body["feedbackMessage"], "great");
        assert_eq!(body.as_object().unwrap().len(), 4);

        let created_at: i64 = body["createdAt"].as_str().unwrap().parse().unwrap();
        assert!(before <= created_at && created_at <= after);
    }

    #[tokio::test]
    async fn test_delete_reconciles_after_success() {
        let received = Arc::new(Mutex::new(None::<(String, Value)>));
        let sink = received.clone();
        let app = Router::new()
            .route(
                "/feedback",
                get(|| async { Json(json!([item("1", "a"), item("2", "b"), item("3", "c")])) }),
            )
            .route(
                "/feedback/:id",
                delete(move |Path(id): Path<String>, Json(body): Json<Value>| {
                    let sink = sink.clone();
                    async move {
                        *sink.lock().unwrap() = Some((id, body));
                        Json(json!({ "deleted": true }))
                    }
                }),
            );
        let gateway = spawn_mock(app).await;

        let mut board = FeedbackBoard::new(FeedbackClient::new(&gateway.base_url));
        assert_ok!(board.refresh().await);
        assert_ok!(board.delete("2", "1700000000000").await);

        assert_eq!(board.items(), &[item("1", "a"), item("3", "c")]);

        let (id, body) = received.lock().unwrap().clone().unwrap();
        assert_eq!(id, "2");
        assert_eq!(body, json!({ "id": "2", "createdAt": "1700000000000" }));
    }
}
