//! Frame parser: raw JSON document into the [`Frame`] model.
//!
//! The serde layer only checks JSON shape. Required keys are validated here so that a
//! missing field is reported with its frame and record position instead of a bare
//! decoder message. Partial frames are never returned.

use serde::Deserialize;

use crate::config::DEFAULT_CAPTURE_FPS;
use crate::data::{
    Animation, CameraRecord, EntityKind, EntityRecord, Frame, PartRole, PushPart, Transform,
};
use crate::error::ImportError;

/// Parse a whole input document (fps plus frames).
pub fn parse_animation_json(s: &str) -> Result<Animation, ImportError> {
    let doc: RawDocument = serde_json::from_str(s)?;
    let fps = doc.fps.unwrap_or(DEFAULT_CAPTURE_FPS);
    let frames = parse_frames(&doc.frames)?;
    Ok(Animation { fps, frames })
}

/// Parse a sequence of raw frame objects. Frame numbers in errors are 1-based.
pub fn parse_frames(frames_raw: &[RawFrame]) -> Result<Vec<Frame>, ImportError> {
    frames_raw
        .iter()
        .enumerate()
        .map(|(i, raw)| parse_frame(i + 1, raw))
        .collect()
}

fn parse_frame(frame_no: usize, raw: &RawFrame) -> Result<Frame, ImportError> {
    let mut frame = Frame::default();
    for kind in EntityKind::ALL {
        let raw_records = match kind {
            EntityKind::Joint => &raw.joints,
            EntityKind::Push => &raw.intervals.push,
            EntityKind::Pull => &raw.intervals.pull,
        };
        let records = frame.records_mut(kind);
        records.reserve(raw_records.len());
        for (index, raw_record) in raw_records.iter().enumerate() {
            let record = parse_record(frame_no, kind, index, raw_record)?;
            if records.iter().any(|r| r.name == record.name) {
                return Err(ImportError::DuplicateEntity {
                    frame: frame_no,
                    kind,
                    name: record.name,
                });
            }
            records.push(record);
        }
    }
    frame.camera = raw
        .camera
        .as_ref()
        .map(|cam| parse_camera(frame_no, cam))
        .transpose()?;
    Ok(frame)
}

fn parse_record(
    frame_no: usize,
    kind: EntityKind,
    index: usize,
    raw: &RawRecord,
) -> Result<EntityRecord, ImportError> {
    let location = || format!("{}[{index}]", kind.json_path());
    let name = raw
        .name
        .clone()
        .ok_or_else(|| ImportError::missing_field(frame_no, location(), "name"))?;
    let transform = match &raw.matrix {
        Some(m) => to_transform(frame_no, &name, m)?,
        None => return Err(ImportError::missing_field(frame_no, location(), "matrix")),
    };

    let mut record = EntityRecord::new(kind, name, transform);
    if kind == EntityKind::Push {
        for role in PartRole::ALL {
            let part = match role {
                PartRole::Bar => &raw.bar,
                PartRole::Holder => &raw.holder,
            };
            let Some(part) = part else { continue };
            let matrix = part.matrix.as_ref().ok_or_else(|| {
                ImportError::missing_field(
                    frame_no,
                    format!("{}.{}", location(), role.json_key()),
                    "matrix",
                )
            })?;
            let transform = to_transform(frame_no, &role.child_name(&record.name), matrix)?;
            record.parts.push(PushPart { role, transform });
        }
    }
    Ok(record)
}

fn to_transform(frame_no: usize, entity: &str, m: &[f64]) -> Result<Transform, ImportError> {
    let elements: [f64; 16] = m.try_into().map_err(|_| {
        ImportError::malformed_transform(
            entity,
            frame_no,
            format!("expected 16 matrix elements, found {}", m.len()),
        )
    })?;
    Ok(Transform(elements))
}

fn parse_camera(frame_no: usize, raw: &RawCamera) -> Result<CameraRecord, ImportError> {
    let position = raw
        .position
        .ok_or_else(|| ImportError::missing_field(frame_no, "camera", "position"))?;
    let target = raw
        .target
        .ok_or_else(|| ImportError::missing_field(frame_no, "camera", "target"))?;
    Ok(CameraRecord { position, target })
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    frames: Vec<RawFrame>,
}

/// One frame object as it appears in the input.
#[derive(Debug, Default, Deserialize)]
pub struct RawFrame {
    #[serde(default)]
    joints: Vec<RawRecord>,
    #[serde(default)]
    intervals: RawIntervals,
    #[serde(default)]
    camera: Option<RawCamera>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIntervals {
    #[serde(default)]
    push: Vec<RawRecord>,
    #[serde(default)]
    pull: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    name: Option<String>,
    matrix: Option<Vec<f64>>,
    // Push-only child parts.
    #[serde(default)]
    bar: Option<RawPart>,
    #[serde(default)]
    holder: Option<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    matrix: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RawCamera {
    position: Option<[f64; 3]>,
    target: Option<[f64; 3]>,
}
