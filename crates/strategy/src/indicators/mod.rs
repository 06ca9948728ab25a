pub mod crossover;

pub use crossover::CrossoverDetector;
