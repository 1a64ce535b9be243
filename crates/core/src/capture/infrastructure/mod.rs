pub mod ffmpeg_camera;
pub mod jpeg_image_encoder;
pub mod photo_file;
