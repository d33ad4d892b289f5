use crate::data::observation::Observation;
use tch::{Kind, Tensor};

/// Flatten a (stacked) observation into a `[1, width]` float tensor
pub fn observation_to_tensor(observation: &Observation, width: usize) -> Tensor {
    rows_to_tensor(&[observation.data()], width)
}

/// Stack rows into a `[batch, width]` tensor.
///
/// Rows shorter or longer than `width` are zero-padded or truncated.
pub fn rows_to_tensor<R: AsRef<[f32]>>(rows: &[R], width: usize) -> Tensor {
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        let row = row.as_ref();
        flat.extend(row.iter().copied().take(width));
        flat.extend(std::iter::repeat(0.0f32).take(width.saturating_sub(row.len())));
    }
    Tensor::from_slice(&flat)
        .view([rows.len() as i64, width as i64])
        .to_kind(Kind::Float)
}

/// One-hot encode a batch of actions into `[batch, action_size]`
pub fn actions_to_tensor(actions: &[usize], action_size: usize) -> Tensor {
    let mut flat = vec![0.0f32; actions.len() * action_size];
    for (row, &action) in actions.iter().enumerate() {
        if action < action_size {
            flat[row * action_size + action] = 1.0;
        }
    }
    Tensor::from_slice(&flat).view([actions.len() as i64, action_size as i64])
}

/// Copy each row of a 2-D tensor into a `Vec<f32>`.
///
/// Conversion failures are logged and yield an empty batch; the search treats the missing
/// outputs as degenerate and sanitises them.
pub fn tensor_to_rows(tensor: &Tensor) -> Vec<Vec<f32>> {
    match Vec::<Vec<f32>>::try_from(&tensor.to_kind(Kind::Float)) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("⚠️ Failed to read tensor {:?}: {}", tensor.size(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_tensor_is_flat_row() {
        let obs = Observation::filled(vec![3, 3, 2], 1.0);
        let t = observation_to_tensor(&obs, 18);
        assert_eq!(t.size(), vec![1, 18]);
    }

    #[test]
    fn test_rows_are_padded_to_width() {
        let t = rows_to_tensor(&[vec![1.0f32], vec![1.0, 2.0, 3.0, 4.0]], 3);
        assert_eq!(t.size(), vec![2, 3]);
        let rows = tensor_to_rows(&t);
        assert_eq!(rows[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(rows[1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_one_hot_actions() {
        let rows = tensor_to_rows(&actions_to_tensor(&[2, 0], 3));
        assert_eq!(rows, vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]]);
    }
}
