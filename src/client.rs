// src/client.rs

use crate::{config::AppConfig, error::*};
use reqwest::{IntoUrl, Response, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
}

impl RobustClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = ClientBuilder::new(builder.build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client })
    }

    /// 带 Referer / Cookie 的 GET，非 2xx 状态视为错误
    pub async fn get<T: IntoUrl>(
        &self,
        url: T,
        referer: Option<&str>,
        cookie: Option<&str>,
    ) -> AppResult<Response> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }
        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            request = request.header(header::COOKIE, cookie);
        }
        let res = request.send().await?;
        Ok(res.error_for_status()?)
    }

    pub async fn get_text<T: IntoUrl>(
        &self,
        url: T,
        referer: Option<&str>,
        cookie: Option<&str>,
    ) -> AppResult<String> {
        Ok(self.get(url, referer, cookie).await?.text().await?)
    }

    pub async fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        referer: Option<&str>,
        cookie: Option<&str>,
    ) -> AppResult<D> {
        let body = self.get_text(url, referer, cookie).await?;
        serde_json::from_str(&body).map_err(|source| AppError::ApiParseFailed {
            url: url.to_string(),
            source,
        })
    }
}
