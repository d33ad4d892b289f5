//! Dense observation frames.
//!
//! A frame is a row-major `f32` buffer with an explicit shape whose last axis is the
//! feature/channel axis, e.g. `(board_x, board_y, planes)`. Temporal stacking concatenates
//! frames along that axis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("shape {shape:?} describes {expected} values but {actual} were given")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("observation shape must have at least one axis")]
    ScalarShape,

    #[error("cannot stack frames with spatial shapes {left:?} and {right:?}")]
    IncompatibleFrames { left: Vec<usize>, right: Vec<usize> },

    #[error("no frames to stack")]
    NoFrames,
}

/// Deserialized frames go through [`Observation::new`], so shape and data always agree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObservation")]
pub struct Observation {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawObservation {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<RawObservation> for Observation {
    type Error = ObservationError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        Observation::new(raw.shape, raw.data)
    }
}

impl Observation {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ObservationError> {
        if shape.is_empty() {
            return Err(ObservationError::ScalarShape);
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ObservationError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Frame of the given shape filled with `value`. An empty shape is treated as `[0]`.
    pub fn filled(shape: Vec<usize>, value: f32) -> Self {
        let shape = if shape.is_empty() { vec![0] } else { shape };
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![value; len],
        }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Placeholder frame with no features (shape `[0]`).
    pub fn empty() -> Self {
        Self::zeros(vec![0])
    }

    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape.clone())
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the trailing feature axis
    pub fn channels(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    fn spatial_shape(&self) -> &[usize] {
        &self.shape[..self.shape.len() - 1]
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Element-wise map preserving the shape
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Channels `[start, end)` of every spatial cell
    pub fn channel_slice(&self, start: usize, end: usize) -> Self {
        let channels = self.channels();
        let end = end.min(channels);
        let start = start.min(end);
        let width = end - start;
        let cells = if channels == 0 { 0 } else { self.data.len() / channels };

        let mut data = Vec::with_capacity(cells * width);
        for cell in 0..cells {
            let offset = cell * channels;
            data.extend_from_slice(&self.data[offset + start..offset + end]);
        }

        let mut shape = self.shape.clone();
        if let Some(last) = shape.last_mut() {
            *last = width;
        }
        Self { shape, data }
    }

    /// Concatenate frames along the channel axis, oldest first.
    pub fn concat_channels(frames: &[&Observation]) -> Result<Observation, ObservationError> {
        let first = frames.first().ok_or(ObservationError::NoFrames)?;
        let spatial = first.spatial_shape();
        for frame in &frames[1..] {
            if frame.spatial_shape() != spatial {
                return Err(ObservationError::IncompatibleFrames {
                    left: spatial.to_vec(),
                    right: frame.spatial_shape().to_vec(),
                });
            }
        }

        let cells: usize = spatial.iter().product();
        let total_channels: usize = frames.iter().map(|f| f.channels()).sum();

        let mut data = Vec::with_capacity(cells * total_channels);
        for cell in 0..cells {
            for frame in frames {
                let c = frame.channels();
                data.extend_from_slice(&frame.data[cell * c..(cell + 1) * c]);
            }
        }

        let mut shape = spatial.to_vec();
        shape.push(total_channels);
        Ok(Observation { shape, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert!(Observation::new(vec![2, 2], vec![0.0; 4]).is_ok());
        assert_eq!(
            Observation::new(vec![2, 2], vec![0.0; 3]),
            Err(ObservationError::ShapeMismatch {
                shape: vec![2, 2],
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            Observation::new(vec![], vec![1.0]),
            Err(ObservationError::ScalarShape)
        );
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let ok: Observation = serde_json::from_str(r#"{"shape":[2,1],"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(ok, Observation::new(vec![2, 1], vec![1.0, 2.0]).unwrap());

        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(serde_json::from_str::<Observation>(&json).unwrap(), ok);

        assert!(serde_json::from_str::<Observation>(r#"{"shape":[2,1],"data":[1.0]}"#).is_err());
        assert!(serde_json::from_str::<Observation>(r#"{"shape":[],"data":[1.0]}"#).is_err());
    }

    #[test]
    fn test_concat_interleaves_channels() {
        // 2 cells, 1 channel each
        let a = Observation::new(vec![2, 1], vec![1.0, 2.0]).unwrap();
        let b = Observation::new(vec![2, 1], vec![10.0, 20.0]).unwrap();
        let stacked = Observation::concat_channels(&[&a, &b]).unwrap();

        assert_eq!(stacked.shape(), &[2, 2]);
        assert_eq!(stacked.data(), &[1.0, 10.0, 2.0, 20.0]);
        assert_eq!(stacked.channel_slice(0, 1), a);
        assert_eq!(stacked.channel_slice(1, 2), b);
    }

    #[test]
    fn test_concat_rejects_mismatched_frames() {
        let a = Observation::zeros(vec![2, 2, 1]);
        let b = Observation::zeros(vec![3, 2, 1]);
        assert!(matches!(
            Observation::concat_channels(&[&a, &b]),
            Err(ObservationError::IncompatibleFrames { .. })
        ));
        assert_eq!(
            Observation::concat_channels(&[]),
            Err(ObservationError::NoFrames)
        );
    }

    #[test]
    fn test_empty_frames_stack_to_empty() {
        let e = Observation::empty();
        let stacked = Observation::concat_channels(&[&e, &e, &e]).unwrap();
        assert_eq!(stacked.shape(), &[0]);
        assert!(stacked.is_empty());
    }
}
