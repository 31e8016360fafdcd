use meeps_timeline::{HistoryError, HistorySource};
use meeps_types::{Message, MessagesResponse, Page, StableId};
use reqwest::Client;
use tracing::debug;

/// Messages per page served by the chat backend.
pub const PAGE_SIZE: usize = 100;

/// `GET {base}/api/messages?channel=..[&before=..]`
pub struct HttpHistorySource {
    client: Client,
    base: String,
}

impl HttpHistorySource {
    pub fn new(base: &str) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl HistorySource for HttpHistorySource {
    async fn fetch(
        &self,
        channel: &str,
        before: Option<&StableId>,
    ) -> Result<Page<Message>, HistoryError> {
        let mut request = self
            .client
            .get(format!("{}/api/messages", self.base))
            .query(&[("channel", channel)]);
        if let Some(before) = before {
            request = request.query(&[("before", before.as_str())]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| HistoryError::Transport(Box::new(e)))?;
        if !resp.status().is_success() {
            return Err(HistoryError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| HistoryError::Decode(e.to_string()))?;
        debug!("Fetched {} messages for #{}", body.messages.len(), channel);
        Ok(body.into_page(PAGE_SIZE))
    }
}
