use super::{ApiError, CaptionApi, ClientConfig};
use crate::model::{GenerateRequest, GenerateResponse, HistoryPage, HistoryRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;

pub struct HttpCaptionClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpCaptionClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;
        let base = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid service URL: {}", cfg.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("invalid service URL: {}", cfg.base_url);
        }
        Ok(Self { http, base })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl CaptionApi for HttpCaptionClient {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        let resp = self
            .http
            .post(self.url(&["api", "generate"]))
            .json(req)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = resp.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list_captions(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        let resp = self
            .http
            .get(self.url(&["api", "captions"]))
            .send()
            .await
            .map_err(ApiError::Transport)?;

        // Status is not checked: the body decides, and a missing `items` is an empty list.
        let body = resp.bytes().await.map_err(ApiError::Transport)?;
        let page: HistoryPage =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(page.items)
    }

    async fn favorite(&self, id: &str, index: usize) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url(&["api", "captions", id, "favorite"]))
            .query(&[("index", index)])
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationParameters, Length, Platform, Tone, VariantCount};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use warp::http::StatusCode;
    use warp::Filter;

    fn client_for(addr: std::net::SocketAddr) -> HttpCaptionClient {
        HttpCaptionClient::new(&ClientConfig {
            base_url: format!("http://{addr}/"),
            user_agent: "blink-captions-test".into(),
        })
        .unwrap()
    }

    fn summer_sale() -> GenerateRequest {
        GenerationParameters::new(
            "Summer sale",
            Tone::Friendly,
            Platform::Instagram,
            Length::Medium,
            true,
            true,
            VariantCount::clamped(3),
        )
        .unwrap()
        .to_request()
    }

    #[tokio::test]
    async fn generate_posts_wire_body_and_decodes_variants() {
        let seen = Arc::new(Mutex::new(None::<serde_json::Value>));
        let seen2 = seen.clone();
        let route = warp::path!("api" / "generate")
            .and(warp::post())
            .and(warp::body::json())
            .map(move |body: serde_json::Value| {
                *seen2.lock().unwrap() = Some(body);
                warp::reply::json(&json!({ "variants": ["A", "B", "C"] }))
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let resp = client_for(addr).generate(&summer_sale()).await.unwrap();
        assert_eq!(resp.variants, vec!["A", "B", "C"]);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["topic"], "Summer sale");
        assert_eq!(body["include_emojis"], true);
        assert_eq!(body["include_hashtags"], true);
        assert_eq!(body["variants"], 3);
    }

    #[tokio::test]
    async fn generate_non_success_status_is_an_error() {
        let route = warp::path!("api" / "generate").and(warp::post()).map(|| {
            warp::reply::with_status(
                warp::reply::json(&json!({ "detail": "boom" })),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let err = client_for(addr).generate(&summer_sale()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status(s) if s == reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn generate_malformed_body_is_a_decode_error() {
        let route = warp::path!("api" / "generate")
            .and(warp::post())
            .map(|| warp::reply::json(&json!({ "captions": [] })));
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let err = client_for(addr).generate(&summer_sale()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn list_captions_treats_missing_items_as_empty() {
        let route = warp::path!("api" / "captions")
            .and(warp::get())
            .map(|| warp::reply::json(&json!({})));
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let items = client_for(addr).list_captions().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn list_captions_decodes_records() {
        let route = warp::path!("api" / "captions").and(warp::get()).map(|| {
            warp::reply::json(&json!({
                "items": [{
                    "_id": "r1",
                    "created_at": "2024-06-01T12:00:00Z",
                    "topic": "Summer sale",
                    "tone": "witty",
                    "platform": "twitter",
                    "length": "long",
                    "variants": ["one", "two"],
                    "favorite": true
                }]
            }))
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let items = client_for(addr).list_captions().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "r1");
        assert_eq!(items[0].tone, Tone::Witty);
        assert_eq!(items[0].variants, vec!["one", "two"]);
        assert!(items[0].favorite);
    }

    #[tokio::test]
    async fn favorite_posts_to_record_path_with_index() {
        let seen = Arc::new(Mutex::new(None::<(String, HashMap<String, String>)>));
        let seen2 = seen.clone();
        let route = warp::path!("api" / "captions" / String / "favorite")
            .and(warp::post())
            .and(warp::query::<HashMap<String, String>>())
            .map(move |id: String, q: HashMap<String, String>| {
                *seen2.lock().unwrap() = Some((id, q));
                warp::reply::json(&json!({ "ok": true }))
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        client_for(addr).favorite("rec-7", 2).await.unwrap();

        let (id, q) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(id, "rec-7");
        assert_eq!(q.get("index").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn favorite_escapes_record_id_as_one_segment() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let seen2 = seen.clone();
        let route = warp::post()
            .and(warp::path::full())
            .map(move |full: warp::path::FullPath| {
                *seen2.lock().unwrap() = Some(full.as_str().to_string());
                warp::reply::json(&json!({ "ok": true }))
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        client_for(addr).favorite("a/b c?d#e", 0).await.unwrap();

        let path = seen.lock().unwrap().clone().unwrap();
        assert_eq!(path, "/api/captions/a%2Fb%20c%3Fd%23e/favorite");
    }

    #[tokio::test]
    async fn list_captions_skips_undecodable_records() {
        let route = warp::path!("api" / "captions").and(warp::get()).map(|| {
            warp::reply::json(&json!({
                "items": [
                    { "_id": "bad", "topic": "x", "tone": "playful", "platform": "tiktok", "length": "short" },
                    { "_id": "ok", "created_at": null, "topic": "y", "tone": "witty", "platform": "twitter", "length": "long" }
                ]
            }))
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let items = client_for(addr).list_captions().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "ok");
    }

    #[test]
    fn rejects_unusable_service_url() {
        let cfg = ClientConfig {
            base_url: "not a url".into(),
            user_agent: "blink-captions-test".into(),
        };
        assert!(HttpCaptionClient::new(&cfg).is_err());
    }
}
