pub mod dense;
pub mod initialization;
pub mod traits;

pub use dense::DenseLayer;
pub use initialization::WeightInit;
pub use traits::{Layer as LayerTrait, LayerGradients};
