pub mod channels;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod io;
pub mod montage;
pub mod signal;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::DatasetConfig;
pub use dataset::{
    EventCode, PhysionetMI, RunRole, RunSelectionPolicy, RunSpec, SessionData, SubjectData,
};
pub use error::{DatasetError, Result};
pub use montage::Montage;
pub use signal::*;
