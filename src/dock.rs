pub mod engine;
pub mod events;
pub mod floating;
pub mod serialization;

#[cfg(test)]
mod tests;
