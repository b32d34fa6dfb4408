use clap::Parser;
use complex_systems::{render_solution, SystemOfEquations};
use std::io::{BufRead, BufReader};

/// Read one linear equation per line from stdin and solve the system.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    /// Print the augmented matrix and its reduced row-echelon form.
    #[arg(long)]
    show_matrix: bool,
    /// Log each step of the elimination.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();

    let mut system = SystemOfEquations::new();
    let stdin = std::io::stdin();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse() {
            Ok(equation) => system.push(equation),
            Err(e) => eprintln!("Unable to parse \"{}\": {}", line, e),
        }
    }

    let unknowns: Vec<_> =
        system.unknowns().iter().map(ToString::to_string).collect();
    println!("Solving for {}", unknowns.join(", "));

    let reduced = system.solve()?;

    if args.show_matrix {
        println!("Augmented matrix:\n{}", system.augmented_matrix()?);
        println!("Reduced:\n{}", reduced.matrix);
    }

    println!("Found:");

    for line in render_solution(&reduced.matrix, &reduced.labels)?.into_lines() {
        println!("  {}", line);
    }

    Ok(())
}
