/// Caption sizing and colors.
pub mod caption;
/// Arena-backed scene tree with bounded-depth pruning.
pub mod graph;
