use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use orbital_relay::graph::VisibilityGraph;
use orbital_relay::io::load_scenario;
use orbital_relay::routing::resolve_route;

const DEFAULT_SCENARIO: &str = "orbital_challenge.csv";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIO));

    let scenario = load_scenario(&path).with_context(|| format!("Failed to load {:?}", path))?;
    if let Some(seed) = &scenario.seed {
        info!("{}", seed);
    }

    let graph = VisibilityGraph::build(scenario.relay_nodes());
    let (mut transmitter, mut receiver) = scenario.endpoints();

    match resolve_route(&graph, &mut transmitter, &mut receiver) {
        Some(route) => {
            println!("Shortest route: {}", route.names(&graph).join(","));
            println!("Distance: {:.3} km", route.distance_km);
        }
        None => println!("No route found"),
    }
    Ok(())
}
