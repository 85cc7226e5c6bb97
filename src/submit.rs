use crate::client::EventSink;
use crate::form::EventForm;
use crate::poller::ReloadHandle;
use std::sync::Arc;
use tracing::{error, info};

/// Sends form submissions and asks for a chart reload once each one lands.
#[derive(Clone)]
pub struct Submitter {
    sink: Arc<dyn EventSink>,
    reload: ReloadHandle,
}

impl Submitter {
    pub fn new(sink: Arc<dyn EventSink>, reload: ReloadHandle) -> Self {
        Self { sink, reload }
    }

    /// Returns whether the event reached the backend. The form is left as is
    /// either way.
    pub async fn submit(&self, form: &EventForm) -> bool {
        let submission = form.to_submission();
        match self.sink.submit_event(&submission).await {
            Ok(()) => {
                info!(
                    event_type = %submission.event_type,
                    location = %submission.location,
                    timestamp = %submission.timestamp,
                    "event saved"
                );
                self.reload.request();
                true
            }
            Err(err) => {
                error!("error saving event: {err}");
                false
            }
        }
    }
}
