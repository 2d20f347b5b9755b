pub use keyed::Keyed;
pub use ordered::{Ordered, Predicate};

mod keyed;
mod ordered;
