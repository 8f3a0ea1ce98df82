use super::{ApiError, CaptionApi};
use crate::model::{GenerateRequest, GenerateResponse, HistoryRecord, Length, Platform, Tone};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Generate(GenerateRequest),
    ListCaptions,
    Favorite { id: String, index: usize },
}

/// Scripted in-memory caption service. Each queue is consumed front to back;
/// an exhausted queue answers with HTTP 500.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub generate: Mutex<VecDeque<Result<GenerateResponse, ApiError>>>,
    pub list: Mutex<VecDeque<Result<Vec<HistoryRecord>, ApiError>>>,
    pub favorite: Mutex<VecDeque<Result<(), ApiError>>>,
    pub calls: Mutex<Vec<Call>>,
}

pub(crate) fn server_error() -> ApiError {
    ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) fn record(id: &str, favorite: bool) -> HistoryRecord {
    HistoryRecord {
        id: id.to_string(),
        created_at: "2024-06-01T12:00:00Z".into(),
        topic: format!("topic {id}"),
        tone: Tone::Friendly,
        platform: Platform::Instagram,
        length: Length::Medium,
        variants: vec!["first".into(), "second".into()],
        favorite,
    }
}

impl FakeApi {
    pub fn on_generate(self, r: Result<Vec<&str>, ApiError>) -> Self {
        let r = r.map(|v| GenerateResponse {
            variants: v.into_iter().map(String::from).collect(),
        });
        self.generate.lock().unwrap().push_back(r);
        self
    }

    pub fn on_list(self, r: Result<Vec<HistoryRecord>, ApiError>) -> Self {
        self.list.lock().unwrap().push_back(r);
        self
    }

    pub fn on_favorite(self, r: Result<(), ApiError>) -> Self {
        self.favorite.lock().unwrap().push_back(r);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }
}

#[async_trait]
impl CaptionApi for FakeApi {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        self.calls.lock().unwrap().push(Call::Generate(req.clone()));
        let next = self.generate.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(server_error()))
    }

    async fn list_captions(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        self.calls.lock().unwrap().push(Call::ListCaptions);
        let next = self.list.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(server_error()))
    }

    async fn favorite(&self, id: &str, index: usize) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call::Favorite {
            id: id.to_string(),
            index,
        });
        let next = self.favorite.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(server_error()))
    }
}
