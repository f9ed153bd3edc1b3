mod application;
mod bin;
mod instance;

#[doc(inline)]
pub use application::Application;
#[doc(inline)]
pub use application::SizeMeasures;
#[doc(inline)]
pub use bin::Bin;
#[doc(inline)]
pub use instance::AppRecord;
#[doc(inline)]
pub use instance::Instance;
#[doc(inline)]
pub use instance::InstanceTotals;
