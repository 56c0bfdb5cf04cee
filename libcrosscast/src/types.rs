//! Core message types for Crosscast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message read from, or destined for, an endpoint.
///
/// Messages are produced either by a connector's fetch path (carrying the
/// endpoint-local `id` the remote service assigned) or locally via
/// [`Message::new`] for the direct posting path. They are treated as
/// immutable once handed to the crossposter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Endpoint-local identity; unique within its source connection only.
    pub id: String,
    /// Message text.
    pub body: String,
    /// Attachments, in display order.
    #[serde(default)]
    pub media: Vec<Media>,
    /// Optional language/visibility/reply metadata.
    #[serde(default)]
    pub metadata: MessageMetadata,
    /// Name of the connection that produced this message; empty for
    /// locally-authored messages.
    #[serde(default)]
    pub source_connection: String,
    /// Id of the message this one replies to, in the *source* connection's
    /// id space.
    #[serde(default)]
    pub reply_to_id: Option<String>,
    /// Unix timestamp of local creation.
    pub created_at: i64,
}

impl Message {
    /// Create a locally-authored message with a generated id.
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), body)
    }

    /// Create a message with a known endpoint-local id.
    ///
    /// This is the constructor connectors use when mapping fetched remote
    /// items into messages.
    pub fn with_id(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            media: Vec::new(),
            metadata: MessageMetadata::default(),
            source_connection: String::new(),
            reply_to_id: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Attach media items.
    pub fn with_media(mut self, media: Vec<Media>) -> Self {
        self.media = media;
        self
    }

    /// Replace the default metadata.
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Record which connection produced this message.
    pub fn with_source(mut self, source_connection: impl Into<String>) -> Self {
        self.source_connection = source_connection.into();
        self
    }

    /// Mark this message as a reply to `parent_id` (source-local id space).
    pub fn with_reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.reply_to_id = Some(parent_id.into());
        self
    }

    /// Whether this message carries anything publishable for a connection
    /// with the given support level.
    ///
    /// Private and direct messages are never publishable. Otherwise the
    /// message qualifies with a non-blank body, or, on connections that
    /// accept media, with at least one valid attachment.
    pub fn has_content(&self, support: MessageSupport) -> bool {
        match self.metadata.visibility {
            MessageVisibility::Private | MessageVisibility::Direct => false,
            MessageVisibility::Public | MessageVisibility::Unlisted => {
                if !self.body.trim().is_empty() {
                    return true;
                }
                support == MessageSupport::TextAndMedia && self.media.iter().any(Media::is_valid)
            }
        }
    }
}

/// Optional message metadata that connections may honor or ignore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// BCP 47 language tag, when the source reports one.
    #[serde(default)]
    pub language: Option<String>,
    /// Content-warning label.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub visibility: MessageVisibility,
    /// Who may reply, when the source restricts it.
    #[serde(default)]
    pub allowed_replies: Option<Vec<AllowedReplies>>,
}

/// Visibility of a message on its source endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageVisibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

/// Who is allowed to reply to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowedReplies {
    Everyone,
    Followers,
    Following,
    MentionedUsers,
    NoOne,
}

/// What kinds of message content a connector can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSupport {
    /// Only the text body is published; attachments are ignored.
    TextOnly,
    /// Text plus media attachments.
    TextAndMedia,
}

/// A media attachment carried inline with a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub mime_type: MediaMimeType,
    /// Raw bytes as fetched from the source.
    pub content: Vec<u8>,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
}

impl Media {
    pub fn new(mime_type: MediaMimeType, content: Vec<u8>) -> Self {
        Self {
            mime_type,
            content,
            alt_text: None,
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }

    /// A media item is valid when it actually has bytes. The MIME
    /// allow-list is enforced by [`MediaMimeType`] itself: anything outside
    /// it cannot be represented and is dropped at the connector boundary
    /// via [`MediaMimeType::from_mime_str`].
    pub fn is_valid(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Supported attachment MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
    Mp4,
    QuickTime,
}

impl MediaMimeType {
    /// Parse a MIME string (e.g. "image/jpeg"); `None` for anything
    /// outside the supported set.
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            "video/mp4" => Some(Self::Mp4),
            "video/quicktime" => Some(Self::QuickTime),
            _ => None,
        }
    }

    /// The canonical MIME string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Mp4 => "video/mp4",
            Self::QuickTime => "video/quicktime",
        }
    }
}

impl std::fmt::Display for MediaMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_uuid() {
        let message = Message::new("hello");

        let uuid = uuid::Uuid::parse_str(&message.id);
        assert!(uuid.is_ok(), "locally-authored ids should be UUIDs");
        assert_eq!(uuid.unwrap().get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn test_new_unique_ids() {
        assert_ne!(Message::new("a").id, Message::new("b").id);
    }

    #[test]
    fn test_with_id_defaults() {
        let message = Message::with_id("42", "hello");

        assert_eq!(message.id, "42");
        assert_eq!(message.body, "hello");
        assert!(message.media.is_empty());
        assert_eq!(message.source_connection, "");
        assert_eq!(message.reply_to_id, None);
        assert_eq!(message.metadata.visibility, MessageVisibility::Public);
        assert!(message.created_at > 1_600_000_000);
    }

    #[test]
    fn test_builder_methods() {
        let message = Message::with_id("42", "hello")
            .with_source("fedi")
            .with_reply_to("41")
            .with_metadata(MessageMetadata {
                language: Some("en".to_string()),
                ..Default::default()
            });

        assert_eq!(message.source_connection, "fedi");
        assert_eq!(message.reply_to_id, Some("41".to_string()));
        assert_eq!(message.metadata.language, Some("en".to_string()));
    }

    #[test]
    fn test_has_content_plain_body() {
        let message = Message::with_id("1", "hello");

        assert!(message.has_content(MessageSupport::TextOnly));
        assert!(message.has_content(MessageSupport::TextAndMedia));
    }

    #[test]
    fn test_has_content_blank_body() {
        let message = Message::with_id("1", "   \n\t ");

        assert!(!message.has_content(MessageSupport::TextOnly));
        assert!(!message.has_content(MessageSupport::TextAndMedia));
    }

    #[test]
    fn test_has_content_media_only() {
        let message = Message::with_id("1", "")
            .with_media(vec![Media::new(MediaMimeType::Png, vec![0x89, 0x50])]);

        // A text-only connection has nothing to publish here, but a
        // media-capable one does.
        assert!(!message.has_content(MessageSupport::TextOnly));
        assert!(message.has_content(MessageSupport::TextAndMedia));
    }

    #[test]
    fn test_has_content_empty_media() {
        let message =
            Message::with_id("1", "").with_media(vec![Media::new(MediaMimeType::Png, vec![])]);

        assert!(!message.has_content(MessageSupport::TextAndMedia));
    }

    #[test]
    fn test_has_content_private_and_direct_never_publishable() {
        for visibility in [MessageVisibility::Private, MessageVisibility::Direct] {
            let message = Message::with_id("1", "secret").with_metadata(MessageMetadata {
                visibility,
                ..Default::default()
            });

            assert!(!message.has_content(MessageSupport::TextOnly));
            assert!(!message.has_content(MessageSupport::TextAndMedia));
        }
    }

    #[test]
    fn test_has_content_unlisted_is_publishable() {
        let message = Message::with_id("1", "hello").with_metadata(MessageMetadata {
            visibility: MessageVisibility::Unlisted,
            ..Default::default()
        });

        assert!(message.has_content(MessageSupport::TextOnly));
    }

    #[test]
    fn test_media_validity() {
        assert!(Media::new(MediaMimeType::Jpeg, vec![1, 2, 3]).is_valid());
        assert!(!Media::new(MediaMimeType::Jpeg, vec![]).is_valid());
    }

    #[test]
    fn test_mime_type_parsing() {
        assert_eq!(
            MediaMimeType::from_mime_str("image/jpeg"),
            Some(MediaMimeType::Jpeg)
        );
        assert_eq!(
            MediaMimeType::from_mime_str("IMAGE/JPG"),
            Some(MediaMimeType::Jpeg)
        );
        assert_eq!(
            MediaMimeType::from_mime_str("video/mp4"),
            Some(MediaMimeType::Mp4)
        );
        assert_eq!(
            MediaMimeType::from_mime_str("video/quicktime"),
            Some(MediaMimeType::QuickTime)
        );
        assert_eq!(MediaMimeType::from_mime_str("application/pdf"), None);
        assert_eq!(MediaMimeType::from_mime_str("text/plain"), None);
    }

    #[test]
    fn test_mime_type_round_trip() {
        for mime in [
            MediaMimeType::Jpeg,
            MediaMimeType::Png,
            MediaMimeType::Gif,
            MediaMimeType::WebP,
            MediaMimeType::Mp4,
            MediaMimeType::QuickTime,
        ] {
            assert_eq!(MediaMimeType::from_mime_str(mime.as_str()), Some(mime));
        }
    }

    #[test]
    fn test_message_serialization_round_trip() {
        let message = Message::with_id("7", "hello")
            .with_source("fedi")
            .with_reply_to("6")
            .with_media(vec![
                Media::new(MediaMimeType::Gif, vec![1, 2]).with_alt_text("a gif")
            ]);

        let json = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, message);
    }

    #[test]
    fn test_visibility_default() {
        assert_eq!(MessageVisibility::default(), MessageVisibility::Public);
    }
}
