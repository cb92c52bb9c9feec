// src/models/notification.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::PortalError;

/// Content categories that have their own broadcast topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Events,
    Jobs,
    Emergency,
    Videos,
    Radio,
    Magazines,
    Business,
}

impl ContentType {
    /// Topic every device interested in this category subscribes to.
    pub fn topic(&self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Events => "events",
            ContentType::Jobs => "jobs",
            ContentType::Emergency => "emergency",
            ContentType::Videos => "videos",
            ContentType::Radio => "radio",
            ContentType::Magazines => "magazines",
            ContentType::Business => "business",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.topic())
    }
}

impl FromStr for ContentType {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "news" => Ok(ContentType::News),
            "events" | "event" => Ok(ContentType::Events),
            "jobs" | "job" => Ok(ContentType::Jobs),
            "emergency" => Ok(ContentType::Emergency),
            "videos" | "video" => Ok(ContentType::Videos),
            "radio" => Ok(ContentType::Radio),
            "magazines" | "magazine" => Ok(ContentType::Magazines),
            "business" | "businesses" => Ok(ContentType::Business),
            other => Err(PortalError::invalid_input(format!("Unknown content type: {}", other))),
        }
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Token(String),
    Topic(String),
    Content(ContentType),
}

/// A notification an admin asked to send. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIntent {
    pub target: NotificationTarget,
    pub title: String,
    pub body: String,
    pub title_ta: Option<String>,
    pub body_ta: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

/// What the push provider actually delivers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl NotificationIntent {
    pub fn new(target: NotificationTarget, title: &str, body: &str) -> Self {
        Self {
            target,
            title: title.to_string(),
            body: body.to_string(),
            title_ta: None,
            body_ta: None,
            image: None,
            link: None,
        }
    }

    pub fn with_tamil(mut self, title_ta: &str, body_ta: &str) -> Self {
        self.title_ta = Some(title_ta.to_string());
        self.body_ta = Some(body_ta.to_string());
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.body.trim().is_empty() {
            missing.push("body");
        }
        missing
    }

    /// The payload a device receives for this intent.
    pub fn message(&self) -> PushMessage {
        match &self.target {
            NotificationTarget::Content(content_type) => self.bilingual_payload(*content_type),
            NotificationTarget::Token(_) | NotificationTarget::Topic(_) => self.payload(),
        }
    }

    /// Plain payload used for token and topic sends.
    pub fn payload(&self) -> PushMessage {
        PushMessage {
            title: self.title.clone(),
            body: self.body.clone(),
            image: non_blank(self.image.as_deref()),
            link: non_blank(self.link.as_deref()),
            data: BTreeMap::new(),
        }
    }

    /// Payload for content-routed sends: English and Tamil text side by side,
    /// with the raw pairs and category kept in the data block for the client.
    pub fn bilingual_payload(&self, content_type: ContentType) -> PushMessage {
        let mut message = self.payload();
        message.title = bilingual(&self.title, self.title_ta.as_deref(), " | ");
        message.body = bilingual(&self.body, self.body_ta.as_deref(), "\n");

        message.data.insert("content_type".to_string(), content_type.to_string());
        if let Some(title_ta) = non_blank(self.title_ta.as_deref()) {
            message.data.insert("title_ta".to_string(), title_ta);
        }
        if let Some(body_ta) = non_blank(self.body_ta.as_deref()) {
            message.data.insert("body_ta".to_string(), body_ta);
        }
        message
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn bilingual(english: &str, tamil: Option<&str>, separator: &str) -> String {
    match non_blank(tamil) {
        Some(tamil) if tamil != english.trim() => format!("{}{}{}", english, separator, tamil),
        _ => english.to_string(),
    }
}

// Request/Response Models
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(rename = "type")]
    pub mode: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub title_ta: Option<String>,
    #[serde(default)]
    pub body_ta: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,
}

impl TryFrom<SendNotificationRequest> for NotificationIntent {
    type Error = PortalError;

    fn try_from(req: SendNotificationRequest) -> Result<Self, Self::Error> {
        let target = match req.mode.trim().to_lowercase().as_str() {
            "token" => NotificationTarget::Token(required(req.target, "target")?),
            "topic" => NotificationTarget::Topic(required(req.target, "target")?),
            "content" => {
                let content_type = required(req.content_type, "contentType")?;
                NotificationTarget::Content(content_type.parse()?)
            }
            other => return Err(PortalError::InvalidAddressMode(other.to_string())),
        };

        Ok(Self {
            target,
            title: req.title,
            body: req.body,
            title_ta: req.title_ta,
            body_ta: req.body_ta,
            image: req.image,
            link: req.link,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, PortalError> {
    non_blank(value.as_deref()).ok_or_else(|| PortalError::missing_field(field))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: &str) -> SendNotificationRequest {
        SendNotificationRequest {
            mode: mode.to_string(),
            target: Some("news".to_string()),
            title: "T".to_string(),
            body: "B".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_topic_request_converts() {
        let intent = NotificationIntent::try_from(request("topic")).unwrap();
        assert_eq!(intent.target, NotificationTarget::Topic("news".to_string()));
    }

    #[test]
    fn test_bogus_mode_rejected() {
        let err = NotificationIntent::try_from(request("bogus")).unwrap_err();
        assert!(matches!(err, PortalError::InvalidAddressMode(mode) if mode == "bogus"));
    }

    #[test]
    fn test_content_mode_requires_content_type() {
        let err = NotificationIntent::try_from(request("content")).unwrap_err();
        assert!(matches!(err, PortalError::MissingRequiredField(field) if field == "contentType"));

        let mut req = request("content");
        req.content_type = Some("Events".to_string());
        let intent = NotificationIntent::try_from(req).unwrap();
        assert_eq!(intent.target, NotificationTarget::Content(ContentType::Events));
    }

    #[test]
    fn test_token_mode_requires_target() {
        let mut req = request("token");
        req.target = Some("   ".to_string());
        let err = NotificationIntent::try_from(req).unwrap_err();
        assert!(matches!(err, PortalError::MissingRequiredField(_)));
    }

    #[test]
    fn test_plain_payload() {
        let intent = NotificationIntent::new(NotificationTarget::Topic("news".into()), "T", "B");
        let payload = intent.payload();
        assert_eq!(payload.title, "T");
        assert_eq!(payload.body, "B");
        assert!(payload.image.is_none());
        assert!(payload.link.is_none());
        assert!(payload.data.is_empty());
    }

    #[test]
    fn test_bilingual_payload() {
        let intent = NotificationIntent::new(NotificationTarget::Content(ContentType::News), "News", "Pongal fair today")
            .with_tamil("செய்திகள்", "இன்று பொங்கல் விழா")
            .with_link("/news/42");
        let payload = intent.bilingual_payload(ContentType::News);

        assert_eq!(payload.title, "News | செய்திகள்");
        assert_eq!(payload.body, "Pongal fair today\nஇன்று பொங்கல் விழா");
        assert_eq!(payload.link.as_deref(), Some("/news/42"));
        assert_eq!(payload.data.get("content_type").map(String::as_str), Some("news"));
        assert_eq!(payload.data.get("title_ta").map(String::as_str), Some("செய்திகள்"));
    }

    #[test]
    fn test_bilingual_payload_without_tamil() {
        let intent = NotificationIntent::new(NotificationTarget::Content(ContentType::Jobs), "Hiring", "Apply now");
        let payload = intent.bilingual_payload(ContentType::Jobs);
        assert_eq!(payload.title, "Hiring");
        assert_eq!(payload.body, "Apply now");
    }

    #[test]
    fn test_missing_fields() {
        let intent = NotificationIntent::new(NotificationTarget::Topic("news".into()), "", " ");
        assert_eq!(intent.missing_fields(), vec!["title", "body"]);
    }

    #[test]
    fn test_content_type_topics() {
        assert_eq!("emergency".parse::<ContentType>().unwrap().topic(), "emergency");
        assert_eq!("event".parse::<ContentType>().unwrap().topic(), "events");
        assert!("weather".parse::<ContentType>().is_err());
    }
}
