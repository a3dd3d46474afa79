pub mod manifest;
pub mod solution;
pub mod template;

pub use manifest::{EntryType, Environment, Manifest, ManifestEntry, ResourceKind};
pub use solution::{NewSolution, OwnedResources, SolutionInstance};
pub use template::SolutionTemplate;
