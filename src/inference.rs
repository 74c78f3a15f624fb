use log::{debug, info};
use ndarray::{ArrayD, ArrayViewD};

use crate::data::BatchSource;
use crate::error::{Error, Result};
use crate::metrics::{accuracy, concat_predictions, DecisionRule};

/// Anything that can score a batch against a served model.
pub trait Predictor {
    /// Returns one row of scores per input row.
    fn predict(&mut self, inputs: &ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub accuracy: f32,
    pub samples: usize,
    pub batches: usize,
}

/// Sends every batch of `source` through `predictor` and scores the results.
pub fn evaluate<P, S>(predictor: &mut P, source: &S, rule: DecisionRule) -> Result<Evaluation>
where
    P: Predictor + ?Sized,
    S: BatchSource + ?Sized,
{
    let mut y_pred = Vec::new();
    let mut y_true = Vec::new();

    for (i, batch) in source.batches().enumerate() {
        let t = std::time::Instant::now();
        let scores = predictor.predict(&batch.inputs.view())?;
        let received = scores.shape().first().copied().unwrap_or(0);
        if received != batch.len() {
            return Err(Error::BatchMismatch {
                sent: batch.len(),
                received,
            });
        }
        debug!("batch {}: {} samples in {:?}", i, batch.len(), t.elapsed());

        y_pred.push(scores);
        y_true.extend(batch.labels);
    }

    let batches = y_pred.len();
    let predictions = concat_predictions(&y_pred)?;
    let accuracy = accuracy(&predictions, &y_true, rule)?;
    info!("scored {} samples over {} batches", y_true.len(), batches);

    Ok(Evaluation {
        accuracy,
        samples: y_true.len(),
        batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemorySource;
    use ndarray::{Array2, Axis, IxDyn};

    /// Echoes the first feature of every sample as its score.
    struct Echo {
        calls: usize,
    }

    impl Predictor for Echo {
        fn predict(&mut self, inputs: &ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
            self.calls += 1;
            let n = inputs.shape()[0];
            let flat = inputs.to_shape((n, inputs.len() / n)).unwrap();
            Ok(flat.index_axis(Axis(1), 0).to_owned().insert_axis(Axis(1)).into_dyn())
        }
    }

    struct Truncating;

    impl Predictor for Truncating {
        fn predict(&mut self, inputs: &ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
            let n = inputs.shape()[0];
            Ok(ArrayD::zeros(IxDyn(&[n - 1, 1])))
        }
    }

    fn source(batch_size: usize) -> InMemorySource {
        let inputs = Array2::from_shape_vec((6, 1), vec![0.9, 0.1, 0.8, 0.2, 0.7, 0.3]).unwrap();
        InMemorySource::new(inputs.into_dyn(), vec![1, 0, 1, 0, 1, 1], batch_size, true).unwrap()
    }

    #[test]
    fn predictions_and_labels_stay_aligned_across_batches() {
        let mut echo = Echo { calls: 0 };
        let eval = evaluate(&mut echo, &source(2), DecisionRule::Round).unwrap();
        assert_eq!(echo.calls, 3);
        assert_eq!(eval.batches, 3);
        assert_eq!(eval.samples, 6);
        assert!((eval.accuracy - 5.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn partial_batch_is_not_sent() {
        let mut echo = Echo { calls: 0 };
        let eval = evaluate(&mut echo, &source(4), DecisionRule::Round).unwrap();
        assert_eq!(echo.calls, 1);
        assert_eq!(eval.samples, 4);
        assert_eq!(eval.accuracy, 1.0);
    }

    #[test]
    fn short_response_is_rejected() {
        let err = evaluate(&mut Truncating, &source(3), DecisionRule::Round).unwrap_err();
        assert!(matches!(err, Error::BatchMismatch { sent: 3, received: 2 }));
    }

    #[test]
    fn empty_source_is_an_error() {
        let mut echo = Echo { calls: 0 };
        let err = evaluate(&mut echo, &source(10), DecisionRule::Round).unwrap_err();
        assert!(matches!(err, Error::EmptyEvaluation));
    }
}
