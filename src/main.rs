use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use morsedb::{
    compute_morse_graph_with_stats, Grid, LeslieMap, MorseConfig, MorseGraph, PointerGrid,
    RectGeo, RefinementStats, SuccinctGrid,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "morsedb", about = "Morse decompositions of box maps over adaptive grids")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Arena of linked nodes.
    Pointer,
    /// Balanced parentheses with rank/select.
    Succinct,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decompose the two-age-class Leslie population model.
    Leslie {
        /// Fertility of the first age class, lower end.
        #[arg(long, default_value_t = 23.0)]
        p0_lower: f64,
        /// Fertility of the first age class, upper end.
        #[arg(long, default_value_t = 23.1)]
        p0_upper: f64,
        /// Fertility of the second age class, lower end.
        #[arg(long, default_value_t = 23.0)]
        p1_lower: f64,
        /// Fertility of the second age class, upper end.
        #[arg(long, default_value_t = 23.1)]
        p1_upper: f64,
        /// Resolution of the first decomposition.
        #[arg(long, default_value_t = 12)]
        min_depth: usize,
        /// Resolution at which Morse sets are frozen.
        #[arg(long, default_value_t = 16)]
        max_depth: usize,
        /// Morse sets larger than this stop refining.
        #[arg(long, default_value_t = 10_000)]
        complexity_limit: usize,
        /// Tree representation behind the grid.
        #[arg(long, value_enum, default_value_t = Backend::Succinct)]
        backend: Backend,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Leslie {
            p0_lower,
            p0_upper,
            p1_lower,
            p1_upper,
            min_depth,
            max_depth,
            complexity_limit,
            backend,
        } => {
            let parameters = RectGeo::new(vec![p0_lower, p1_lower], vec![p0_upper, p1_upper]);
            let config = MorseConfig::new(min_depth, max_depth, complexity_limit)
                .context("invalid refinement depths")?;
            run_leslie(&parameters, &config, backend)?
        }
    }

    Ok(())
}

fn run_leslie(parameters: &RectGeo, config: &MorseConfig, backend: Backend) -> Result<()> {
    let map = LeslieMap::from_parameter_box(parameters);
    let bounds = RectGeo::new(vec![0.0, 0.0], vec![320.0, 224.0]);

    match backend {
        Backend::Pointer => {
            let (graph, stats) =
                compute_morse_graph_with_stats(PointerGrid::new(bounds), &map, config)
                    .with_context(|| format!("Leslie decomposition failed for {parameters}"))?;
            report(&graph, &stats);
        }
        Backend::Succinct => {
            let (graph, stats) =
                compute_morse_graph_with_stats(SuccinctGrid::new(bounds), &map, config)
                    .with_context(|| format!("Leslie decomposition failed for {parameters}"))?;
            report(&graph, &stats);
        }
    }
    Ok(())
}

fn report<G: Grid>(graph: &MorseGraph<G>, stats: &RefinementStats) {
    for v in graph.vertices() {
        let grid = graph.grid(v);
        let hull = grid
            .elements()
            .filter_map(|element| grid.geometry(element).ok())
            .reduce(|hull, cell| hull.hull(&cell));
        match hull {
            Some(hull) => println!(
                "vertex {v}\tdepth={}\tcells={}\thull={hull}",
                graph.depth(v),
                grid.size()
            ),
            None => println!("vertex {v}\tdepth={}\tcells=0", graph.depth(v)),
        }
    }
    for (from, to) in graph.edges() {
        println!("edge {from} -> {to}");
    }
    println!(
        "vertices={}\tedges={}\tdecompositions={}\tsubdivisions={}\tspurious={}\tmap_failures={}\tpeak_graph_bytes={}",
        graph.num_vertices(),
        graph.num_edges(),
        stats.decompositions,
        stats.subdivisions,
        stats.spurious_sets,
        stats.map_failures,
        stats.peak_graph_memory
    );
    if let Some(phase_space) = graph.phase_space() {
        println!("phase_space_cells={}", phase_space.size());
    }
    println!("fingerprint={}", graph.fingerprint());
}
