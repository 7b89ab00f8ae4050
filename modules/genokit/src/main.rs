use clap::{self, Parser};
use log::{error, info};
use simple_logger::init_with_level;

use genokit::{
    cli::{Args, Commands},
    code::run_code,
    diff::run_diff,
    frames::run_orfs,
    genome::run_genome,
    mutation::run_mutation,
    orthologs::run_orthologs,
    pretty::run_pretty,
    stats::run_stats,
};

fn main() {
    let start = std::time::Instant::now();

    let args = Args::parse();

    init_with_level(args.level).unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .unwrap();

    let result = match args.command {
        Commands::Mutation(args) => run_mutation(args),
        Commands::Orthologs(args) => run_orthologs(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Genome(args) => run_genome(args),
        Commands::Pretty(args) => run_pretty(args),
        Commands::Orfs(args) => run_orfs(args),
        Commands::Diff(args) => run_diff(args),
        Commands::Code(args) => run_code(args),
    };

    if let Err(e) = result {
        error!("ERROR: {e:#}");
        std::process::exit(1);
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
