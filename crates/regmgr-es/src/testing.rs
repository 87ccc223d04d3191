//! Scripted engine for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use regmgr_core::{Error, Result};
use serde_json::Value;

use crate::client::{Request, Response, SearchEngine};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedEngine {
    replies: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, body: Value) -> Self {
        self.push(Ok(Response::json(body)));
        self
    }

    pub(crate) fn reply_with(self, response: Response) -> Self {
        self.push(Ok(response));
        self
    }

    pub(crate) fn fail(self, err: Error) -> Self {
        self.push(Err(err));
        self
    }

    fn push(&self, reply: Result<Response>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn request(&self, request: Request) -> Result<Response> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| {
                Err(Error::transport(format!(
                    "No scripted reply for {} {}",
                    request.method, request.path
                )))
            })
    }
}
