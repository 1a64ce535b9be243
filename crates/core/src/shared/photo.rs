use std::path::Path;

use crate::shared::constants::CAPTURE_MIME;

/// An encoded photo ready to be attached to a submission.
///
/// Holds the exact bytes that go on the wire together with the file name
/// and content type of the multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn jpeg(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: CAPTURE_MIME.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content type for a user-chosen file, guessed from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_jpeg_constructor_sets_mime() {
        let photo = Photo::jpeg("comparacion_S1.jpg", vec![0xFF, 0xD8]);
        assert_eq!(photo.mime, "image/jpeg");
        assert_eq!(photo.file_name, "comparacion_S1.jpg");
        assert_eq!(photo.len(), 2);
        assert!(!photo.is_empty());
    }

    #[rstest]
    #[case("foto.JPG", "image/jpeg")]
    #[case("foto.jpeg", "image/jpeg")]
    #[case("a/b/foto.png", "image/png")]
    #[case("foto.webp", "image/webp")]
    #[case("foto", "application/octet-stream")]
    #[case("foto.heic", "application/octet-stream")]
    fn test_mime_for_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(mime_for_path(Path::new(path)), expected);
    }
}
