//! Abstraction and representative walkthrough.
//!
//! Builds a small cost function over `N` variables, abstracts a set of them
//! with every operator, and prints the minimizing and maximizing assignments.
//!
//! Run with:
//! ```bash
//! cargo run --example abstraction -- 4 --cube 1,3
//! cargo run --example abstraction -- 3 --cube 2 --reverse --dot
//! ```

use add_rs::abstraction::Abstraction;
use add_rs::diagram::Diagram;
use add_rs::manager::AddManager;
use add_rs::types::Var;
use clap::Parser;
use color_eyre::eyre::ensure;

#[derive(Debug, Parser)]
#[command(name = "ADD abstraction demo")]
#[command(about = "Abstract variables out of an algebraic decision diagram", long_about = None)]
struct Cli {
    /// Number of variables
    #[arg(value_name = "N", default_value = "4")]
    n: u32,

    /// Variables to abstract (comma-separated ids)
    #[arg(short, long, value_delimiter = ',', default_value = "1")]
    cube: Vec<u32>,

    /// Reverse the variable order before abstracting
    #[arg(long)]
    reverse: bool,

    /// Print the min-representative in DOT format
    #[arg(long)]
    dot: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    ensure!((1..=12).contains(&args.n), "N must be between 1 and 12");
    for &id in &args.cube {
        ensure!((1..=args.n).contains(&id), "cube variable {} is out of range", id);
    }

    let mgr = AddManager::default();
    let vars: Vec<Var> = (1..=args.n).map(Var::new).collect();

    // Cost of an assignment: a weighted bit count with a penalty on adjacent pairs.
    let f = mgr.tabulate(&vars, |a| {
        let weights: f64 = a.iter().enumerate().filter(|&(_, &b)| b).map(|(i, _)| (i % 3 + 1) as f64).sum();
        let pairs = a.windows(2).filter(|w| w[0] && w[1]).count() as f64;
        weights - 2.0 * pairs
    })?;
    let cube = mgr.cube(args.cube.iter().map(|&id| Var::new(id)))?;

    if args.reverse {
        let reversed: Vec<Var> = mgr.order().into_iter().rev().collect();
        let stats = mgr.reorder(&reversed)?;
        println!("Reordered with {} swaps: {} -> {} nodes", stats.swaps, stats.initial_size, stats.final_size);
    }

    println!("=== f over {} variables ===", args.n);
    println!("  order:  {:?}", mgr.order());
    println!("  size:   {}", mgr.size(&f));
    println!("  leaves: {:?}", mgr.leaves(&f));
    println!("  cube:   {:?}", mgr.support(&cube));
    println!();

    println!("─── Abstractions ───");
    for op in Abstraction::ALL {
        let g = mgr.abstract_with(op, &f, &cube)?;
        println!(
            "  {:<12} size {:>3}, support {:?}, leaves {:?}",
            op.to_string(),
            mgr.size(&g),
            mgr.support(&g),
            mgr.leaves(&g)
        );
    }
    println!();

    println!("─── Representatives ───");
    let rest: Vec<Var> = vars.iter().copied().filter(|v| !args.cube.contains(&v.id())).collect();
    let min = mgr.min_representative(&f, &cube)?;
    let max = mgr.max_representative(&f, &cube)?;
    for bits in 0..1u32 << rest.len() {
        let outer = |v: Var| rest.iter().position(|&u| u == v).is_some_and(|i| bits >> i & 1 == 1);
        println!(
            "  {} -> min at {}, max at {}",
            show(&rest, &outer),
            witness(&mgr, &min, &vars, &args.cube, &outer),
            witness(&mgr, &max, &vars, &args.cube, &outer)
        );
    }

    if args.dot {
        println!();
        println!("{}", mgr.to_dot(&[&min])?);
    }

    let stats = mgr.stats();
    println!();
    println!(
        "Stats: {} live of {} nodes (peak {}), {} GC runs, {} reorders",
        stats.live_nodes, stats.total_nodes, stats.peak_nodes, stats.gc_runs, stats.reorders
    );
    Ok(())
}

fn show(vars: &[Var], value: &impl Fn(Var) -> bool) -> String {
    if vars.is_empty() {
        return "()".to_string();
    }
    vars.iter()
        .map(|&v| format!("{}={}", v, value(v) as u8))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds the cube assignment selected by `w` for the given outer assignment.
fn witness(mgr: &AddManager, w: &Diagram<'_>, vars: &[Var], cube: &[u32], outer: &impl Fn(Var) -> bool) -> String {
    let inner: Vec<Var> = vars.iter().copied().filter(|v| cube.contains(&v.id())).collect();
    for bits in 0..1u32 << inner.len() {
        let value = |v: Var| match inner.iter().position(|&u| u == v) {
            Some(i) => bits >> i & 1 == 1,
            None => outer(v),
        };
        if mgr.eval(w, value) == 1.0 {
            return show(&inner, &value);
        }
    }
    "none".to_string()
}
