use crate::models::ResourceType;

/// Guess a MIME type from a file name's extension.
pub fn guess_mime_from_name(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Namespace Cloudinary files a given MIME type under when uploading with `auto`.
///
/// Audio lands in `video`, as it does on the vendor side.
pub fn resource_type_for_mime(mime: &str) -> ResourceType {
    if mime.starts_with("image/") {
        ResourceType::Image
    } else if mime.starts_with("video/") || mime.starts_with("audio/") {
        ResourceType::Video
    } else {
        ResourceType::Raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_known_extensions() {
        assert_eq!(guess_mime_from_name("holiday.JPG"), Some("image/jpeg"));
        assert_eq!(guess_mime_from_name("clip.final.mp4"), Some("video/mp4"));
        assert_eq!(guess_mime_from_name("notes.pdf"), Some("application/pdf"));
    }

    #[test]
    fn test_guess_unknown_or_missing_extension() {
        assert_eq!(guess_mime_from_name("archive.xyz"), None);
        assert_eq!(guess_mime_from_name("README"), None);
    }

    #[test]
    fn test_resource_type_for_mime() {
        assert_eq!(resource_type_for_mime("image/png"), ResourceType::Image);
        assert_eq!(resource_type_for_mime("audio/mpeg"), ResourceType::Video);
        assert_eq!(resource_type_for_mime("application/pdf"), ResourceType::Raw);
    }
}
