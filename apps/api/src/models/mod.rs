pub mod application;
pub mod persona;

pub use application::{
    ApplicationRecord, ApplicationStatus, ArtifactBundle, MatchMetrics,
};
pub use persona::Persona;
