//! MinIO `notify_webhook` configuration entries.

/// A webhook target for one service, as staged in MinIO's config store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEntry {
    name: String,
    endpoint: String,
}

impl WebhookEntry {
    /// Entry for service `name`, calling back into `callback_endpoint`.
    pub fn new(name: &str, callback_endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: format!("{callback_endpoint}/job/{name}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL MinIO posts events to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Config key: `notify_webhook:<name>`.
    pub fn key(&self) -> String {
        webhook_key(&self.name)
    }

    /// Full config line: `notify_webhook:<name> endpoint=<url>`.
    pub fn config_kv(&self) -> String {
        format!("{} endpoint={}", self.key(), self.endpoint)
    }
}

pub fn webhook_key(name: &str) -> String {
    format!("notify_webhook:{name}")
}
