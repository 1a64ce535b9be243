use std::fs;
use std::path::Path;

use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::Frame;
use crate::shared::photo::{mime_for_path, Photo};

/// Reads a user-chosen image file.
///
/// The returned [`Photo`] carries the file's bytes and name untouched; the
/// [`Frame`] is a decoded copy for running detection on.
pub fn read_photo(path: &Path) -> Result<(Photo, Frame), CaptureError> {
    let bytes = fs::read(path).map_err(|source| CaptureError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|source| CaptureError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "foto".to_string());

    let photo = Photo {
        file_name,
        mime: mime_for_path(path).to_string(),
        bytes,
    };
    Ok((photo, Frame::from_rgb_image(decoded, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_bytes_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ana_perez.png");
        let mut img = image::RgbImage::new(40, 30);
        img.put_pixel(0, 0, image::Rgb([1, 2, 3]));
        img.save(&path).unwrap();
        let on_disk = fs::read(&path).unwrap();

        let (photo, frame) = read_photo(&path).unwrap();

        assert_eq!(photo.bytes, on_disk);
        assert_eq!(photo.file_name, "ana_perez.png");
        assert_eq!(photo.mime, "image/png");
        assert_eq!((frame.width(), frame.height()), (40, 30));
        assert_eq!(&frame.data()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = read_photo(Path::new("/nonexistent/foto.jpg"));
        assert!(matches!(result, Err(CaptureError::ReadFile { .. })));
    }

    #[test]
    fn test_non_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notas.jpg");
        fs::write(&path, b"not an image").unwrap();
        assert!(matches!(read_photo(&path), Err(CaptureError::Decode { .. })));
    }
}
