/// Response content types, keyed by the file extensions the static fallback
/// understands.
///
/// The table is fixed: an extension outside it does not map to a content
/// type and the static fallback treats that as a read error. `txt`/`text`
/// deliberately serve as HTML, matching the original wire behavior this
/// framework replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Text,
    Js,
    Css,
    Jpg,
    Ico,
    Gif,
    Json,
    Xml,
}

impl ContentType {
    /// MIME value emitted on the `content-type` response header.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html | ContentType::Text => "text/html; charset=utf-8",
            ContentType::Js => "text/javascript; charset=utf-8",
            ContentType::Css => "text/css",
            ContentType::Jpg => "image/jpeg",
            ContentType::Ico => "image/vnd.microsoft.icon",
            ContentType::Gif => "image/gif",
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
        }
    }

    /// Map a file extension (without the dot) to a content type.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "html" | "htm" => Some(ContentType::Html),
            "txt" | "text" => Some(ContentType::Text),
            "js" => Some(ContentType::Js),
            "css" => Some(ContentType::Css),
            "jpg" => Some(ContentType::Jpg),
            "ico" => Some(ContentType::Ico),
            "gif" => Some(ContentType::Gif),
            "json" => Some(ContentType::Json),
            "xml" => Some(ContentType::Xml),
            _ => None,
        }
    }
}
