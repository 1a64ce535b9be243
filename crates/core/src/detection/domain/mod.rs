pub mod detection_gate;
pub mod face_detector;
