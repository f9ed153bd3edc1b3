/// Set of functions used throughout to assure the correctness of the library.
pub mod assertions;

mod config;
mod reorder;

#[doc(inline)]
pub use config::PackerConfig;
#[doc(inline)]
pub use reorder::bubble_up;

/// `num / den`, or 0 when the denominator vanishes
pub fn ratio(num: f64, den: f64) -> f64 {
    match den == 0.0 {
        true => 0.0,
        false => num / den,
    }
}
