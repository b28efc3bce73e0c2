use attack_tree::cli::Args;
use attack_tree::config::Config;
use attack_tree::formatter::truncated_percent;
use attack_tree::{AttackTreePipeline, RunReport};
use clap::Parser;
use console::style;
use env_logger::Env;

fn print_summary(report: &RunReport, currency: &str) {
    println!();
    println!(
        "    {} {} {}",
        style("▶").green(),
        style("Attack tree generated").white().bold(),
        style("✓").green()
    );
    println!("    {} Root: {}", style("├─").dim(), style(&report.root_label).white().bold());

    for branch in &report.branches {
        println!(
            "    {}   {} {}{} at {}%",
            style("├─").dim(),
            style(&branch.name).cyan(),
            currency,
            branch.monetary_total,
            truncated_percent(branch.probability)
        );
    }

    println!(
        "    {} Nodes: {}  Edges: {}  Leaves: {}",
        style("├─").dim(),
        style(report.node_count).white().bold(),
        style(report.edge_count).white().bold(),
        style(report.leaf_count).white().bold()
    );
    println!(
        "    {} Catalog sha256: {}",
        style("├─").dim(),
        style(&report.input_digest[..16.min(report.input_digest.len())]).dim()
    );
    println!(
        "    {} Saved to {} at {}",
        style("└─").dim(),
        style(report.output_path.display()).white().bold(),
        report.generated_at
    );
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    log::debug!("attack-tree starting with args: {:?}", args);

    let config = Config::from(&args);
    let pipeline = match AttackTreePipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    let report = match pipeline.run() {
        Ok(report) => report,
        Err(e) => {
            log::error!("Attack tree generation failed: {}", e);
            return Err(e.into());
        }
    };

    if !args.quiet {
        print_summary(&report, &pipeline.config().currency_symbol);
    }

    Ok(())
}
