use ndarray::{concatenate, ArrayD, ArrayView1, Axis};

use crate::error::{Error, Result};

/// How a row of model scores is turned into a class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    /// Binary output: round the single score to the nearest integer.
    Round,
    /// Multi-class output: index of the highest score.
    ArgMax,
}

pub fn argmax_and_max(scores: &ArrayView1<f32>) -> (usize, f32) {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, &val)| {
            if val > max_val { (i, val) } else { (max_idx, max_val) }
        })
}

/// Concatenates per-batch predictions along the batch axis.
pub fn concat_predictions(batches: &[ArrayD<f32>]) -> Result<ArrayD<f32>> {
    if batches.is_empty() {
        return Err(Error::EmptyEvaluation);
    }
    let views: Vec<_> = batches.iter().map(|b| b.view()).collect();
    Ok(concatenate(Axis(0), &views)?)
}

/// Maps every prediction row to a class label using `rule`.
pub fn predicted_classes(predictions: &ArrayD<f32>, rule: DecisionRule) -> Result<Vec<i64>> {
    match rule {
        DecisionRule::Round => {
            let shape = predictions.shape();
            let rows_are_scalar = match shape.len() {
                1 => true,
                2 => shape[1] == 1,
                _ => false,
            };
            if !rows_are_scalar {
                return Err(Error::ShapeMismatch {
                    expected: vec![shape.first().copied().unwrap_or(0), 1],
                    actual: shape.to_vec(),
                });
            }
            // tf.round rounds half to even.
            Ok(predictions.iter().map(|p| p.round_ties_even() as i64).collect())
        }
        DecisionRule::ArgMax => {
            let scores = predictions.view().into_dimensionality::<ndarray::Ix2>()?;
            Ok(scores
                .axis_iter(Axis(0))
                .map(|row| argmax_and_max(&row).0 as i64)
                .collect())
        }
    }
}

/// Fraction of predictions whose class matches the label at the same position.
pub fn accuracy(predictions: &ArrayD<f32>, labels: &[i64], rule: DecisionRule) -> Result<f32> {
    let classes = predicted_classes(predictions, rule)?;
    if classes.len() != labels.len() {
        return Err(Error::BatchMismatch {
            sent: labels.len(),
            received: classes.len(),
        });
    }
    if labels.is_empty() {
        return Err(Error::EmptyEvaluation);
    }

    let correct = classes
        .iter()
        .zip(labels)
        .filter(|(predicted, truth)| predicted == truth)
        .count();
    Ok(correct as f32 / labels.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn rounding_uses_half_a_boundary() {
        let predictions = arr1(&[0.2f32, 0.8, 0.49, 0.51]).into_dyn();
        let acc = accuracy(&predictions, &[0, 1, 0, 1], DecisionRule::Round).unwrap();
        assert_eq!(acc, 1.0);
    }

    #[test]
    fn rounding_accepts_column_vectors() {
        let predictions = arr2(&[[0.9f32], [0.1], [0.7], [0.3]]).into_dyn();
        let acc = accuracy(&predictions, &[1, 1, 1, 0], DecisionRule::Round).unwrap();
        assert_eq!(acc, 0.75);
    }

    #[test]
    fn exact_half_rounds_to_even() {
        let predictions = arr1(&[0.5f32, 1.5]).into_dyn();
        assert_eq!(predicted_classes(&predictions, DecisionRule::Round).unwrap(), vec![0, 2]);
    }

    #[test]
    fn rounding_rejects_multi_class_scores() {
        let predictions = arr2(&[[0.1f32, 0.9], [0.8, 0.2]]).into_dyn();
        assert!(accuracy(&predictions, &[1, 0], DecisionRule::Round).is_err());
    }

    #[test]
    fn argmax_ignores_non_maximal_scores() {
        let predictions = arr2(&[
            [0.9f32, 0.05, 0.05],
            [-3.0, 7.5, 7.4],
            [0.0, 0.0, 1e-6],
        ])
        .into_dyn();
        let acc = accuracy(&predictions, &[0, 1, 2], DecisionRule::ArgMax).unwrap();
        assert_eq!(acc, 1.0);
    }

    #[test]
    fn argmax_picks_first_of_equal_scores() {
        let predictions = arr2(&[[0.5f32, 0.5]]).into_dyn();
        assert_eq!(predicted_classes(&predictions, DecisionRule::ArgMax).unwrap(), vec![0]);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let predictions = arr1(&[0.2f32, 0.8]).into_dyn();
        assert!(matches!(
            accuracy(&predictions, &[0, 1, 1], DecisionRule::Round),
            Err(Error::BatchMismatch { sent: 3, received: 2 })
        ));
    }

    #[test]
    fn empty_evaluation_is_an_error() {
        let predictions = ArrayD::<f32>::zeros(ndarray::IxDyn(&[0]));
        assert!(matches!(
            accuracy(&predictions, &[], DecisionRule::Round),
            Err(Error::EmptyEvaluation)
        ));
    }

    #[test]
    fn concatenation_preserves_batch_order() {
        let batches = vec![
            arr2(&[[0.1f32], [0.9]]).into_dyn(),
            arr2(&[[0.8f32], [0.2]]).into_dyn(),
        ];
        let all = concat_predictions(&batches).unwrap();
        assert_eq!(all.shape(), &[4, 1]);
        assert_eq!(
            predicted_classes(&all, DecisionRule::Round).unwrap(),
            vec![0, 1, 1, 0]
        );
    }
}
