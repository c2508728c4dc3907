pub mod facility;
pub mod geo;
pub mod hours;

pub use facility::*;
pub use geo::*;
pub use hours::*;
