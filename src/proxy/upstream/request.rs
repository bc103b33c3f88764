// Typed upstream requests, one constructor per call site
use std::time::Duration;

const SERVERS_TTL: Duration = Duration::from_secs(3600);
const SEARCH_TTL: Duration = Duration::from_secs(30);
const CHARACTER_TTL: Duration = Duration::from_secs(60);

const SEARCH_LIMIT: &str = "10";

/// A read-only upstream call. The API key is not part of it; the client appends it when sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Path segments below the upstream base, unencoded
    pub segments: Vec<String>,
    /// Query parameters in send order
    pub params: Vec<(&'static str, String)>,
    pub ttl: Duration,
}

impl UpstreamRequest {
    /// `GET /servers`
    pub fn servers() -> Self {
        Self {
            segments: vec!["servers".to_string()],
            params: Vec::new(),
            ttl: SERVERS_TTL,
        }
    }

    /// `GET /servers/{server}/characters?characterName=..&limit=10`
    pub fn character_search(server: &str, name: &str) -> Self {
        Self {
            segments: vec![
                "servers".to_string(),
                server.to_string(),
                "characters".to_string(),
            ],
            params: vec![
                ("characterName", name.to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
            ],
            ttl: SEARCH_TTL,
        }
    }

    /// `GET /servers/{server}/characters/{characterId}`
    pub fn character_basic(server: &str, character_id: &str) -> Self {
        Self {
            segments: vec![
                "servers".to_string(),
                server.to_string(),
                "characters".to_string(),
                character_id.to_string(),
            ],
            params: Vec::new(),
            ttl: CHARACTER_TTL,
        }
    }

    /// `GET /servers/{server}/characters/{characterId}/equip/equipment`
    pub fn character_equipment(server: &str, character_id: &str) -> Self {
        let mut request = Self::character_basic(server, character_id);
        request
            .segments
            .extend(["equip".to_string(), "equipment".to_string()]);
        request
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_and_ttl() {
        let req = UpstreamRequest::character_search("cain", "홍길동");
        assert_eq!(req.segments, vec!["servers", "cain", "characters"]);
        assert_eq!(
            req.params,
            vec![
                ("characterName", "홍길동".to_string()),
                ("limit", "10".to_string())
            ]
        );
        assert_eq!(req.ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_character_paths() {
        let basic = UpstreamRequest::character_basic("cain", "abc123");
        let equip = UpstreamRequest::character_equipment("cain", "abc123");

        assert_eq!(basic.segments, vec!["servers", "cain", "characters", "abc123"]);
        assert_eq!(
            equip.segments,
            vec!["servers", "cain", "characters", "abc123", "equip", "equipment"]
        );
        assert_eq!(basic.ttl, Duration::from_secs(60));
        assert_eq!(equip.ttl, Duration::from_secs(60));
        assert!(equip.params.is_empty());
    }

    #[test]
    fn test_servers_ttl() {
        assert_eq!(UpstreamRequest::servers().ttl, Duration::from_secs(3600));
    }
}
