use ndarray::Array2;

use crate::params::Params;
use crate::tally::Tally;

/// Everything a finished run produces: the scatter image, the photon
/// bookkeeping, and the metrics derived from both.
#[derive(Debug, PartialEq, Clone)]
pub struct Results {
    pub image: Array2<f64>,
    pub tally: Tally,
    pub params: Params,
}

impl Results {
    pub fn new(image: Array2<f64>, tally: Tally) -> Self {
        let params = Params::new(&tally, &image);
        Self {
            image,
            tally,
            params,
        }
    }

    /// Creates a run result with an untouched detector of the given pixel
    /// dimensions.
    pub fn new_empty(width: usize, height: usize) -> Self {
        Self::new(Array2::zeros((height, width)), Tally::new())
    }

    /// Prints the tally and the derived metrics to stdout.
    pub fn print(&self) {
        println!("{}", self.tally);
        println!("{}", self.params);
    }
}
