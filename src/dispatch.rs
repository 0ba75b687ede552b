use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::api::LookupService;
use crate::search::{ApiEvent, Command};

/// Runs controller commands as background tasks and reports each result as an
/// `ApiEvent` on a channel the UI loop drains. Nothing is ever cancelled;
/// stale results are filtered by the controller.
#[derive(Clone)]
pub struct Dispatcher {
    handle: Handle,
    service: Arc<dyn LookupService>,
    events: UnboundedSender<ApiEvent>,
}

impl Dispatcher {
    pub fn new(
        handle: Handle,
        service: Arc<dyn LookupService>,
    ) -> (Self, UnboundedReceiver<ApiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                handle,
                service,
                events,
            },
            receiver,
        )
    }

    pub fn dispatch(&self, command: Command) {
        debug!(target: "dispatch", "Dispatching {:?}", command);
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        self.handle.spawn(async move {
            let event = run_command(service.as_ref(), command).await;
            if events.send(event).is_err() {
                debug!(target: "dispatch", "UI loop gone, dropping result");
            }
        });
    }
}

/// Execute one command against the backend
pub async fn run_command(service: &dyn LookupService, command: Command) -> ApiEvent {
    match command {
        Command::FetchMeta => ApiEvent::Meta(service.meta().await),
        Command::Suggest { seq, query, limit } => ApiEvent::Suggestions {
            seq,
            result: service.suggest(&query, limit).await,
        },
        Command::Lookup { seq, name } => ApiEvent::Lookup {
            seq,
            result: service.lookup(&name).await,
        },
        Command::Reload => ApiEvent::Reloaded(service.reload().await),
    }
}
