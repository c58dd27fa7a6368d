//! Price Source (Fetcher)
//!
//! 업스트림 가격 API 호출 및 결과 정규화
//!
//! # Implementations
//!
//! 1. `CoinGeckoSource`: simple/price 단일 요청
//! 2. `TokenApiSource`: Bearer 토큰 인증, 심볼당 요청 1회
//!
//! 두 리비전은 배타적이며 배포당 하나만 선택 (`from_config`)
//!
//! # Error Mapping
//!
//! 모든 실패는 이 경계에서 `FetchOutcome::error`로 변환됨
//! - non-2xx → "API responded with status: N"
//! - 네트워크 에러 → reqwest 에러 메시지
//! - JSON 파싱 실패 → serde_json 에러 메시지
//!
//! 재시도 없음: 다음 tick이 자연스러운 재시도

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::FetchError;
use crate::types::FetchOutcome;

const USER_AGENT: &str = concat!("crypto-price-api/", env!("CARGO_PKG_VERSION"));

/// 가격 데이터 소스
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 로그용 이름
    fn name(&self) -> &str;

    /// 한 번의 갱신 시도
    async fn fetch(&self) -> Result<Value, FetchError>;
}

/// fetch 결과를 envelope로 변환
pub async fn fetch_outcome(source: &dyn PriceSource) -> FetchOutcome {
    match source.fetch().await {
        Ok(data) => FetchOutcome::success(data),
        Err(err) => {
            tracing::warn!(source = source.name(), error = %err, "Error fetching crypto data");
            FetchOutcome::error(err.to_string())
        }
    }
}

/// 설정에 맞는 업스트림 생성
pub fn from_config(upstream: &UpstreamConfig, timeout: Duration) -> Result<Arc<dyn PriceSource>> {
    let http = build_http_client(timeout)?;

    let source: Arc<dyn PriceSource> = match upstream {
        UpstreamConfig::CoinGecko { base_url, coin_ids } => {
            Arc::new(CoinGeckoSource::new(http, base_url, coin_ids.clone()))
        }
        UpstreamConfig::TokenApi {
            base_url,
            token,
            symbols,
        } => Arc::new(TokenApiSource::new(http, base_url, token, symbols.clone())),
    };

    Ok(source)
}

/// 공유 HTTP 클라이언트 (요청 타임아웃 포함)
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// status 확인 후 body를 JSON으로 파싱
async fn read_json(response: reqwest::Response) -> Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

// ============ CoinGecko ============

/// CoinGecko simple/price
///
/// ```text
/// GET /api/v3/simple/price?ids=bitcoin,ethereum,binancecoin&vs_currencies=usd&include_24hr_change=true
///
/// { "bitcoin": { "usd": 43000.0, "usd_24h_change": 1.23 }, ... }
/// ```
pub struct CoinGeckoSource {
    http: reqwest::Client,
    url: String,
}

impl CoinGeckoSource {
    pub fn new(http: reqwest::Client, base_url: &str, coin_ids: Vec<String>) -> Self {
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            base_url.trim_end_matches('/'),
            coin_ids.join(",")
        );
        Self { http, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self.http.get(&self.url).send().await?;
        read_json(response).await
    }
}

// ============ Token API ============

/// Bearer 토큰 인증 API
///
/// ```text
/// GET /v1/getData?symbol=BTC
/// Authorization: Bearer <token>
///
/// { "status": "success", "symbols": [{ "symbol": "BTC", "last": "...", ... }] }
/// ```
///
/// # Partial Failure
///
/// 심볼별 요청 결과를 순서대로 배열에 담고, 실패한 칸은 `null`.
/// 일부(또는 전부) 실패해도 전체 결과는 성공으로 보고됨
pub struct TokenApiSource {
    http: reqwest::Client,
    base_url: String,
    token: String,
    symbols: Vec<String>,
}

impl TokenApiSource {
    pub fn new(http: reqwest::Client, base_url: &str, token: &str, symbols: Vec<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            symbols,
        }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(format!("{}/v1/getData", self.base_url))
            .query(&[("symbol", symbol)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let body = read_json(response).await?;
        Ok(first_symbol_record(body))
    }
}

/// `symbols` 배열이 있으면 첫 원소, 없으면 body 전체
fn first_symbol_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("symbols") {
            Some(Value::Array(mut records)) if !records.is_empty() => records.swap_remove(0),
            Some(other) => {
                map.insert("symbols".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

#[async_trait]
impl PriceSource for TokenApiSource {
    fn name(&self) -> &str {
        "token"
    }

    async fn fetch(&self) -> Result<Value, FetchError> {
        let requests = self.symbols.iter().map(|symbol| self.fetch_symbol(symbol));
        let results = futures::future::join_all(requests).await;

        let slots = self
            .symbols
            .iter()
            .zip(results)
            .map(|(symbol, result)| match result {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(symbol = %symbol, error = %err, "Error fetching symbol");
                    Value::Null
                }
            })
            .collect();

        Ok(Value::Array(slots))
    }
}
