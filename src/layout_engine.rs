pub mod graph;
pub mod grid;

pub use graph::{Direction, TextDirection};
pub use grid::{
    GridConstraints, GridGeometry, GridLayoutEngine, GridSettings, SizeRequest, TileFrame, layout,
};

#[cfg(test)]
mod tests;
