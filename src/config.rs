//! Configuration Module
//!
//! 환경변수 기반 설정 (12-Factor)
//!
//! - 모든 값은 기본값을 가지며, 잘못된 값은 시작 시점에 즉시 실패 (fail-fast)
//! - 업스트림은 배포당 하나만 선택 (`PRICE_UPSTREAM`)
//! - `FEEDBACK_API_URL`은 서버가 쓰지 않는 라이브러리 전용 값 (`FeedbackClient::from_config`)

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 3000)
    pub port: u16,

    /// 환경 (development, staging, production)
    pub environment: Environment,

    /// 프로덕션 CORS 허용 origin 목록
    pub allowed_origins: Vec<String>,

    /// 가격 업스트림 설정
    pub upstream: UpstreamConfig,

    /// 갱신 주기 (기본값: 5000ms)
    pub refresh_interval: Duration,

    /// 업스트림 요청 타임아웃 (기본값: 10초)
    pub upstream_timeout: Duration,

    /// 피드백 API Gateway URL (옵션)
    pub feedback_api_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// 업스트림 가격 API 선택
///
/// 두 리비전은 서로 배타적이며 조합하지 않음
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamConfig {
    /// CoinGecko simple/price (단일 요청)
    CoinGecko { base_url: String, coin_ids: Vec<String> },
    /// Bearer 토큰 인증 API (심볼당 요청 1회)
    TokenApi {
        base_url: String,
        token: String,
        symbols: Vec<String>,
    },
}

impl UpstreamConfig {
    pub fn name(&self) -> &'static str {
        match self {
            UpstreamConfig::CoinGecko { .. } => "coingecko",
            UpstreamConfig::TokenApi { .. } => "token",
        }
    }
}

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com";
pub const DEFAULT_TOKEN_API_URL: &str = "https://api.freecryptoapi.com";
pub const DEFAULT_COIN_IDS: &str = "bitcoin,ethereum,binancecoin";
pub const DEFAULT_SYMBOLS: &str = "BTC,ETH,LTC";

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Optional Environment Variables
    ///
    /// - `PORT`: 서버 포트 (기본값: 3000)
    /// - `ENVIRONMENT`: development | staging | production
    /// - `ALLOWED_ORIGINS`: 프로덕션 CORS origin (쉼표 구분)
    /// - `PRICE_UPSTREAM`: coingecko | token
    /// - `COINGECKO_API_URL`, `COIN_IDS`
    /// - `CRYPTO_API_URL`, `CRYPTO_API_TOKEN`, `CRYPTO_SYMBOLS`
    /// - `REFRESH_INTERVAL_MS`: 갱신 주기 (기본값: 5000)
    /// - `UPSTREAM_TIMEOUT_SECS`: 요청 타임아웃 (기본값: 10)
    /// - `FEEDBACK_API_URL`: 피드백 API Gateway
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 lookup 함수로 설정 로드 (테스트에서 프로세스 환경변수 대신 사용)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = match var("ENVIRONMENT", "development").to_lowercase().as_str() {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let upstream = match var("PRICE_UPSTREAM", "coingecko").to_lowercase().as_str() {
            "coingecko" => UpstreamConfig::CoinGecko {
                base_url: var("COINGECKO_API_URL", DEFAULT_COINGECKO_URL),
                coin_ids: split_list(&var("COIN_IDS", DEFAULT_COIN_IDS)),
            },
            "token" => UpstreamConfig::TokenApi {
                base_url: var("CRYPTO_API_URL", DEFAULT_TOKEN_API_URL),
                token: lookup("CRYPTO_API_TOKEN")
                    .filter(|t| !t.is_empty())
                    .context("CRYPTO_API_TOKEN is required when PRICE_UPSTREAM=token")?,
                symbols: split_list(&var("CRYPTO_SYMBOLS", DEFAULT_SYMBOLS)),
            },
            other => bail!("Unknown PRICE_UPSTREAM: {}", other),
        };

        let refresh_ms: u64 = var("REFRESH_INTERVAL_MS", "5000")
            .parse()
            .context("REFRESH_INTERVAL_MS must be a valid number")?;
        if refresh_ms == 0 {
            bail!("REFRESH_INTERVAL_MS must be greater than zero");
        }

        let timeout_secs: u64 = var("UPSTREAM_TIMEOUT_SECS", "10")
            .parse()
            .context("UPSTREAM_TIMEOUT_SECS must be a valid number")?;

        Ok(Config {
            port: var("PORT", "3000")
                .parse()
                .context("PORT must be a valid number")?,
            environment,
            allowed_origins: split_list(&var("ALLOWED_ORIGINS", "https://yourdomain.com")),
            upstream,
            refresh_interval: Duration::from_millis(refresh_ms),
            upstream_timeout: Duration::from_secs(timeout_secs),
            feedback_api_url: lookup("FEEDBACK_API_URL").filter(|u| !u.is_empty()),
        })
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
