pub mod config;
pub mod error;
pub mod procgen;
pub mod systems;

#[cfg(test)]
mod test;
