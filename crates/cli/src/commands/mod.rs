pub mod analyze;
pub mod detect;
pub mod diagrams;
pub mod run;
pub mod sources;
pub mod util;
pub mod validate;

pub use analyze::*;
pub use detect::*;
pub use diagrams::*;
pub use run::*;
pub use sources::*;
pub use util::*;
pub use validate::*;
