//! Client configuration.
//!
//! Loaded from `TASKLINE_*` environment variables with local-development
//! defaults. The gateway URL points at the HTTP submission proxy; the stream
//! host is the pub/sub socket endpoint. The API key is only required on the
//! publish side of the socket.

/// Connection endpoints and credentials for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the HTTP gateway, e.g. `http://127.0.0.1:3000`.
    pub gateway_base_url: String,
    /// Host (and optional port) of the pub/sub socket endpoint.
    pub stream_host: String,
    /// Key appended to publish connections (`?key=...`). Subscribing does
    /// not require it.
    pub stream_api_key: String,
    /// `wss://` when set, `ws://` otherwise. Defaults to secure.
    pub stream_tls: bool,
    /// Optional bearer token attached to gateway requests.
    pub gateway_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: "http://127.0.0.1:3000".to_string(),
            stream_host: "localhost".to_string(),
            stream_api_key: String::new(),
            stream_tls: true,
            gateway_token: None,
        }
    }
}

impl ClientConfig {
    /// Build from environment variables, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let stream_tls = match std::env::var("TASKLINE_STREAM_TLS").as_deref() {
            Ok("0") | Ok("false") => false,
            Ok(_) => true,
            Err(_) => defaults.stream_tls,
        };
        Self {
            gateway_base_url: std::env::var("TASKLINE_GATEWAY_URL")
                .unwrap_or(defaults.gateway_base_url),
            stream_host: std::env::var("TASKLINE_STREAM_HOST").unwrap_or(defaults.stream_host),
            stream_api_key: std::env::var("TASKLINE_STREAM_API_KEY")
                .unwrap_or(defaults.stream_api_key),
            stream_tls,
            gateway_token: std::env::var("TASKLINE_GATEWAY_TOKEN").ok(),
        }
    }

    fn ws_scheme(&self) -> &'static str {
        if self.stream_tls {
            "wss"
        } else {
            "ws"
        }
    }

    /// Read-path endpoint for one task's event stream.
    pub fn subscribe_url(&self, topic: &str) -> String {
        format!("{}://{}/ws/subscribe/{topic}", self.ws_scheme(), self.stream_host)
    }

    /// Write-path endpoint for producers.
    pub fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}://{}/ws/publish/{topic}?key={}",
            self.ws_scheme(),
            self.stream_host,
            self.stream_api_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_url_embeds_topic() {
        let config = ClientConfig {
            stream_host: "stream.example.com".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.subscribe_url("t1"),
            "wss://stream.example.com/ws/subscribe/t1"
        );
    }

    #[test]
    fn publish_url_carries_key_and_scheme_follows_tls_flag() {
        let config = ClientConfig {
            stream_host: "127.0.0.1:9300".to_string(),
            stream_api_key: "k123".to_string(),
            stream_tls: false,
            ..ClientConfig::default()
        };
        assert_eq!(
            config.publish_url("t1"),
            "ws://127.0.0.1:9300/ws/publish/t1?key=k123"
        );
    }

    #[test]
    fn defaults_target_local_development() {
        let config = ClientConfig::default();
        assert_eq!(config.gateway_base_url, "http://127.0.0.1:3000");
        assert!(config.stream_tls);
        assert!(config.gateway_token.is_none());
    }
}
