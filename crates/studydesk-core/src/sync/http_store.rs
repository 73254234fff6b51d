//! JSON-over-HTTP document store client.
//!
//! Layout under the configured base URL:
//!
//! ```text
//! PUT    users/{uid}/sessions/{id}          session record
//! PUT    users/{uid}/{collection}/{id}      task/event upsert
//! DELETE users/{uid}/{collection}/{id}      task/event delete
//! POST   users/{uid}/profile/increments     profile delta
//! GET    users/{uid}/sessions?date=DAY      records for a day
//! GET    users/{uid}/profile                profile document (404 = none)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::accounting::{DayKey, ProfileDelta, SessionRecord, UserProfile};
use crate::error::RemoteError;
use crate::sync::remote::RemoteStore;
use crate::sync::types::{Collection, DocumentMutation, MutationOp};

pub struct HttpRemoteStore {
    client: Client,
    base: Url,
}

impl HttpRemoteStore {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut base = Url::parse(endpoint)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidEndpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn put_session(&self, user_id: &str, record: &SessionRecord) -> Result<(), RemoteError> {
        let url = self.url(&["users", user_id, "sessions", &record.id])?;
        let response = self.client.put(url).json(record).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn apply_mutation(
        &self,
        user_id: &str,
        collection: Collection,
        mutation: &DocumentMutation,
    ) -> Result<(), RemoteError> {
        let url = self.url(&["users", user_id, collection.path(), &mutation.id])?;
        let request = match mutation.op {
            MutationOp::Upsert => self.client.put(url).json(mutation),
            MutationOp::Delete => self.client.delete(url),
        };
        let response = request.send().await?;
        if mutation.op == MutationOp::Delete && response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn increment_profile(&self, user_id: &str, delta: &ProfileDelta) -> Result<(), RemoteError> {
        let url = self.url(&["users", user_id, "profile", "increments"])?;
        let response = self.client.post(url).json(delta).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn sessions_for_day(&self, user_id: &str, day: &DayKey) -> Result<Vec<SessionRecord>, RemoteError> {
        let mut url = self.url(&["users", user_id, "sessions"])?;
        url.query_pairs_mut().append_pair("date", day.as_str());
        let response = Self::check(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RemoteError> {
        let url = self.url(&["users", user_id, "profile"])?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::check(response).await?.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}
