pub mod geo;
pub mod graph;
pub mod routing;
pub mod io;
