use reqwest::{RequestBuilder, StatusCode};

use crate::models::player::{PlayerInfo, Uid};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("player not found")]
    NotFound,

    #[error("stats api returned {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("couldn't decode stats response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct FreeFireClient {
    client: reqwest::Client,
    info_url: String,
    profile_url: String,
}

impl FreeFireClient {
    pub fn new(
        client: reqwest::Client,
        info_url: impl Into<String>,
        profile_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            info_url: info_url.into(),
            profile_url: profile_url.into(),
        }
    }

    fn info_request(&self, uid: &Uid) -> RequestBuilder {
        self.client
            .get(&self.info_url)
            .query(&[("uid", uid.as_str())])
    }

    fn profile_request(&self, uid: &Uid) -> RequestBuilder {
        self.client
            .get(&self.profile_url)
            .query(&[("uid", uid.as_str())])
    }

    #[tracing::instrument(skip_all, fields(uid = %uid))]
    pub async fn get_player_info(&self, uid: &Uid) -> Result<PlayerInfo, FetchError> {
        let resp = self.info_request(uid).send().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when fetching player info"),
        )?;

        check_status(resp.status())
            .inspect_err(|e| tracing::warn!(err = %e, "stats api rejected the lookup"))?;

        let text = resp.text().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when receiving response text"),
        )?;

        let info = serde_json::from_str(&text).inspect_err(
            |e| tracing::error!(err = ?e, text = %text, "an error occurred when parsing response body"),
        )?;

        Ok(info)
    }

    /// Returns `None` when the generator has nothing for this player.
    #[tracing::instrument(skip_all, fields(uid = %uid))]
    pub async fn get_profile_image(&self, uid: &Uid) -> Result<Option<Vec<u8>>, FetchError> {
        let resp = self.profile_request(uid).send().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when fetching profile image"),
        )?;

        if resp.status() != StatusCode::OK {
            tracing::warn!(status = %resp.status(), "profile image generator returned no image");
            return Ok(None);
        }

        let bytes = resp.bytes().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when receiving profile image"),
        )?;

        Ok(Some(bytes.to_vec()))
    }
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        other => Err(FetchError::Status(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FreeFireClient {
        FreeFireClient::new(
            reqwest::Client::new(),
            "http://stats.invalid/info",
            "http://stats.invalid/api/profile",
        )
    }

    #[test]
    fn builds_lookup_urls() {
        let uid: Uid = "1234567890".parse().unwrap();
        let client = client();

        let info = client.info_request(&uid).build().unwrap();
        assert_eq!(info.url().as_str(), "http://stats.invalid/info?uid=1234567890");

        let profile = client.profile_request(&uid).build().unwrap();
        assert_eq!(
            profile.url().as_str(),
            "http://stats.invalid/api/profile?uid=1234567890"
        );
    }

    #[test]
    fn classifies_statuses() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(FetchError::NotFound)
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(FetchError::Status(StatusCode::BAD_GATEWAY))
        ));
        assert!(matches!(
            check_status(StatusCode::NO_CONTENT),
            Err(FetchError::Status(_))
        ));
    }
}
