use super::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("could not encode the location: {0}")]
    Encode(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered with status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// No URL was entered so nothing was sent.
    NotSent,
    Delivered { status: u16 },
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Posts locations to the destination and tells the user how it went.
#[derive(Clone)]
pub struct DeliveryClient {
    agent: ureq::Agent,
    notifier: Arc<dyn Notifier>,
}

impl DeliveryClient {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            agent: ureq::agent(),
            notifier,
        }
    }

    /// Send `coords` to `url` with a single POST.
    ///
    /// Every outcome ends in exactly one notification. Failures are logged and
    /// returned, never retried.
    pub fn send(&self, coords: &Coordinates, url: &str) -> DeliveryOutcome {
        if url.is_empty() {
            log::debug!("No URL entered, {} is not sent.", coords);
            self.notifier.notify(&Notification::new(
                "URL not entered",
                "Location was not sent to the server",
            ));
            return DeliveryOutcome::NotSent;
        }

        match self.post(coords, url) {
            Ok(status) => {
                log::info!("Sent {} to {} ({}).", coords, url, status);
                self.notifier.notify(&Notification::new(
                    "Success",
                    "Location was sent to the server",
                ));
                DeliveryOutcome::Delivered { status }
            }
            Err(e) => {
                self.notifier
                    .notify(&Notification::new("Server delivery failed", "Check the URL"));
                log::error!("Could not send {} to {}. Reason:\r\n{}", coords, url, e);
                DeliveryOutcome::Failed(e)
            }
        }
    }

    fn post(&self, coords: &Coordinates, url: &str) -> Result<u16, DeliveryError> {
        let body = coords
            .to_json()
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;

        let response = self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(&body);

        if let Some(e) = response.synthetic_error() {
            return Err(DeliveryError::Transport(e.to_string()));
        }
        if response.ok() {
            Ok(response.status())
        } else {
            Err(DeliveryError::Status(response.status()))
        }
    }
}
