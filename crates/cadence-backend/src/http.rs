//! JSON-over-HTTP backend.
//!
//! `ureq` is blocking; every request runs on `spawn_blocking`. Status codes
//! are interpreted here rather than by `ureq` so that 404 / 409 / 412 / 401
//! map onto [`BackendError`] variants.

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::api_paths;
use cadence_core::models::assignment::Assignment;
use cadence_core::models::completion::Completion;
use cadence_core::models::questionnaire::Questionnaire;
use cadence_core::models::user::Role;
use cadence_core::wire;

use crate::backend::{Backend, BoxFuture, OccurrenceWrite};
use crate::error::BackendError;
use crate::session::{Session, SessionContext};

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user_id: Uuid,
    role: Role,
}

pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    session: Arc<SessionContext>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration, session: Arc<SessionContext>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Exchange credentials for a token and start the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let body = wire::encode(&LoginRequest { email, password })?;
        let response: LoginResponse = self
            .request(Method::Post, api_paths::LOGIN.to_string(), Some(body), "login")
            .await?;
        let session = Session {
            token: response.token,
            user_id: response.user_id,
            role: response.role,
            started_at: Timestamp::now(),
        };
        self.session.init(session.clone())?;
        Ok(session)
    }

    /// Tell the backend, then end the session locally whatever it answered.
    pub async fn logout(&self) -> Result<(), BackendError> {
        let result = self
            .exchange(Method::Post, api_paths::LOGOUT.to_string(), None)
            .await;
        self.session.teardown();
        match result {
            Ok(_) | Err(BackendError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn get<T>(&self, path: String, kind: &'static str) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::Get, path, None, kind).await
    }

    async fn post<T, B>(&self, path: String, body: Option<&B>, kind: &'static str) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let body = body.map(wire::encode).transpose()?;
        self.request(Method::Post, path, body, kind).await
    }

    async fn request<T>(
        &self,
        method: Method,
        path: String,
        body: Option<Vec<u8>>,
        kind: &'static str,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.exchange(method, path, body).await?;
        Ok(wire::decode(kind, &bytes)?)
    }

    /// Send one request and return the body of a 2xx response.
    async fn exchange(
        &self,
        method: Method,
        path: String,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, BackendError> {
        let agent = self.agent.clone();
        let url = self.url(&path);
        let token = self.session.token();

        let (status, bytes) = tokio::task::spawn_blocking(move || {
            send_blocking(&agent, method, &url, token.as_deref(), body)
        })
        .await
        .map_err(|e| BackendError::Transport(format!("request task failed: {e}")))??;

        match status {
            200..=299 => {
                tracing::debug!(?method, path = %path, status, "backend request");
                Ok(bytes)
            }
            401 => {
                tracing::warn!(path = %path, "backend rejected session");
                self.session.teardown();
                Err(BackendError::Unauthorized)
            }
            404 => Err(BackendError::NotFound { path }),
            409 | 412 => Err(BackendError::Conflict { path }),
            _ => Err(BackendError::Http {
                status,
                path,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}

fn authorize<B>(request: ureq::RequestBuilder<B>, token: Option<&str>) -> ureq::RequestBuilder<B> {
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {token}")),
        None => request,
    }
}

fn send_blocking(
    agent: &ureq::Agent,
    method: Method,
    url: &str,
    token: Option<&str>,
    body: Option<Vec<u8>>,
) -> Result<(u16, Vec<u8>), BackendError> {
    let transport = |e: ureq::Error| BackendError::Transport(e.to_string());

    let result = match method {
        Method::Get => authorize(agent.get(url), token)
            .header("Accept", "application/json")
            .call(),
        Method::Post | Method::Put => {
            let request = match method {
                Method::Put => agent.put(url),
                _ => agent.post(url),
            };
            let request = authorize(request, token).header("Accept", "application/json");
            match body {
                Some(body) => request
                    .header("Content-Type", "application/json")
                    .send(&body[..]),
                None => request.send_empty(),
            }
        }
    };

    let mut response = result.map_err(transport)?;
    let status = response.status().as_u16();
    let bytes = response.body_mut().read_to_vec().map_err(transport)?;
    Ok((status, bytes))
}

impl Backend for HttpBackend {
    fn evaluable_assignments(&self) -> BoxFuture<'_, Result<Vec<Assignment>, BackendError>> {
        Box::pin(self.get(api_paths::ASSIGNMENTS_EVALUABLE.to_string(), "assignment list"))
    }

    fn assignment(&self, id: Uuid) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(self.get(api_paths::assignment(id), "assignment"))
    }

    fn create_assignment(
        &self,
        assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(async move {
            self.post(api_paths::ASSIGNMENTS.to_string(), Some(&assignment), "assignment")
                .await
        })
    }

    fn update_assignment(
        &self,
        assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(async move {
            let body = wire::encode(&assignment)?;
            self.request(
                Method::Put,
                api_paths::assignment(assignment.id),
                Some(body),
                "assignment",
            )
            .await
        })
    }

    fn create_occurrence(
        &self,
        write: OccurrenceWrite,
    ) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let path = api_paths::assignment_occurrences(write.completion.assignment_id);
            self.post(path, Some(&write), "completion").await
        })
    }

    fn completion(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(self.get(api_paths::completion(id), "completion"))
    }

    fn assignment_completions(
        &self,
        assignment_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>> {
        Box::pin(self.get(
            api_paths::assignment_completions(assignment_id),
            "completion list",
        ))
    }

    fn patient_completions(
        &self,
        patient_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>> {
        Box::pin(self.get(api_paths::patient_completions(patient_id), "completion list"))
    }

    fn submit_answers(
        &self,
        completion: Completion,
    ) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            self.post(
                api_paths::completion_answers(completion.id),
                Some(&completion),
                "completion",
            )
            .await
        })
    }

    fn mark_missed(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(self.post::<_, ()>(api_paths::completion_missed(id), None, "completion"))
    }

    fn mark_read(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(self.post::<_, ()>(api_paths::completion_read(id), None, "completion"))
    }

    fn mark_sent(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(self.post::<_, ()>(api_paths::completion_sent(id), None, "completion"))
    }

    fn questionnaire(&self, id: Uuid) -> BoxFuture<'_, Result<Questionnaire, BackendError>> {
        Box::pin(self.get(api_paths::questionnaire(id), "questionnaire"))
    }
}
