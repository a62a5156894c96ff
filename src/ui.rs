pub mod switcher;
pub mod tile;
