pub mod estimator;
pub mod evaluation;
pub mod predictor;
pub mod trainer;

pub use estimator::{EstimatorParams, FittedModel, ModelFamily, Task};
pub use evaluation::{ClassificationScores, EvalReport, RegressionScores};
pub use predictor::{Prediction, SocDropModel, SocDropPredictor};
pub use trainer::{TrainedModels, TrainerConfig, train_models};
