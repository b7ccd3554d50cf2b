pub mod mission;
pub mod probe;
pub mod finding;
pub mod technology;
pub mod report;

pub use mission::*;
pub use probe::*;
pub use finding::*;
pub use technology::*;
pub use report::*;
