/// YOLO face detector running on ONNX Runtime via `ort`.
///
/// Letterboxes each frame to the requested input size, runs inference and
/// reduces the raw candidates with score filtering and greedy NMS.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectorOptions, FaceDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Network stride; dynamic-shape inputs are rounded up to a multiple of it.
const STRIDE: u32 = 32;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Minimum values per candidate row: cx, cy, w, h, score.
const MIN_ROW_LEN: usize = 5;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    /// Input side baked into the model, `None` when the model takes any size.
    fixed_input_size: Option<u32>,
}

impl OnnxFaceDetector {
    /// Load a YOLO face ONNX model.
    ///
    /// A model exported with a static NCHW shape always runs at that size;
    /// otherwise the size comes from the [`DetectorOptions`] of each call.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let fixed_input_size = session.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    return Some(shape[2] as u32);
                }
            }
            None
        });
        match fixed_input_size {
            Some(size) => log::info!("Loaded face model with fixed input {size}x{size}"),
            None => log::info!("Loaded face model with dynamic input size"),
        }

        Ok(Self {
            session,
            fixed_input_size,
        })
    }

    fn input_size_for(&self, options: &DetectorOptions) -> u32 {
        self.fixed_input_size
            .unwrap_or_else(|| round_to_stride(options.input_size))
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let input_size = self.input_size_for(options);
        let (input_tensor, letterbox) = letterbox(frame, input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("unexpected face model output shape: {shape:?}").into());
        }
        // Either [1, features, candidates] or [1, candidates, features].
        let transposed = shape[1] < shape[2];
        let (num_candidates, num_features) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_features < MIN_ROW_LEN {
            return Err(format!("face model rows too short: {num_features}").into());
        }
        let data = tensor.as_slice().ok_or("cannot read face model output")?;

        let feature = |candidate: usize, f: usize| -> f64 {
            if transposed {
                data[f * num_candidates + candidate] as f64
            } else {
                data[candidate * num_features + f] as f64
            }
        };

        let mut candidates = Vec::new();
        for i in 0..num_candidates {
            let score = feature(i, 4);
            if score < options.score_threshold {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            candidates.push(Candidate {
                bbox: letterbox.to_frame([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]),
                score,
            });
        }

        let kept = nms(candidates, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|c| {
                let [x1, y1, x2, y2] = c.bbox;
                Region::from_corners(x1, y1, x2, y2, c.score, frame.width(), frame.height())
            })
            .filter(|r| r.area() > 0)
            .collect())
    }
}

fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

fn round_to_stride(size: u32) -> u32 {
    size.max(STRIDE).div_ceil(STRIDE) * STRIDE
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Placement of the scaled frame inside the square network input.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Letterbox {
    fn to_frame(&self, [x1, y1, x2, y2]: [f64; 4]) -> [f64; 4] {
        [
            (x1 - self.pad_x) / self.scale,
            (y1 - self.pad_y) / self.scale,
            (x2 - self.pad_x) / self.scale,
            (y2 - self.pad_y) / self.scale,
        ]
    }
}

/// Letterbox-resize a frame into a `size` × `size` NCHW float tensor in [0, 1].
fn letterbox(frame: &Frame, size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(size);
    let new_h = ((fh * scale).round() as u32).min(size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    // Padding is YOLO gray (114).
    let gray = 114.0f32 / 255.0;
    let s = size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, s, s), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    bbox: [f64; 4],
    score: f64,
}

/// Greedy NMS: highest score first, drop anything overlapping a kept box.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for c in candidates {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &c.bbox) <= iou_thresh) {
            keep.push(c);
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}
