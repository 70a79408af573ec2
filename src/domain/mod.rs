// Domain layer - Pure scheduling and pricing logic
pub mod mode;
pub mod price;
pub mod schedule;
pub mod slot;
pub mod validation;
