mod bin_centric;
/// Scoring of bins and applications
pub mod measures;
mod node_count;
mod packer;
mod policy;
mod registry;
mod spread;
mod state;
/// Running a portfolio of algorithms on one instance
pub mod sweep;

#[doc(inline)]
pub use packer::Packer;
#[doc(inline)]
pub use policy::AppOrder;
#[doc(inline)]
pub use policy::BinSelection;
#[doc(inline)]
pub use policy::FitScore;
#[doc(inline)]
pub use policy::Measure;
#[doc(inline)]
pub use policy::Reorder;
#[doc(inline)]
pub use policy::Strategy;
#[doc(inline)]
pub use registry::AlgoRegistry;
#[doc(inline)]
pub use registry::create_packer;
#[doc(inline)]
pub use state::RunStatus;
