//! End-to-end run: load the catalog, aggregate, build and draw the tree.

use std::path::PathBuf;

use crate::aggregator::{AggregatedBranch, Aggregator, RootAggregate};
use crate::catalog::ThreatCatalog;
use crate::config::Config;
use crate::errors::AttackTreeResult;
use crate::formatter::LabelFormatter;
use crate::graph::{AttackGraph, GraphBuilder};
use crate::layout::spring_layout;
use crate::renderer::{Renderer, SvgRenderer};

/// Outcome of one run, shown to the user and then dropped.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub root_label: String,
    pub root: RootAggregate,
    pub branches: Vec<AggregatedBranch>,
    pub branch_count: usize,
    pub leaf_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub input_digest: String,
    pub output_path: PathBuf,
    pub generated_at: String,
}

/// Aggregates and graph of a catalog, before anything is drawn.
#[derive(Debug, Clone)]
pub struct AnalyzedTree {
    pub root_label: String,
    pub root: RootAggregate,
    pub branches: Vec<AggregatedBranch>,
    pub graph: AttackGraph,
}

pub struct AttackTreePipeline {
    config: Config,
    aggregator: Aggregator,
    formatter: LabelFormatter,
}

impl AttackTreePipeline {
    /// Fails when the configured precision is out of range.
    pub fn new(config: Config) -> AttackTreeResult<Self> {
        let aggregator = Aggregator::new(config.precision)?;
        let formatter = LabelFormatter::new(config.currency_symbol.clone());
        Ok(Self {
            config,
            aggregator,
            formatter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Aggregate a validated catalog and build its attack graph.
    pub fn analyze(&self, catalog: &ThreatCatalog) -> AttackTreeResult<AnalyzedTree> {
        let children = catalog.branches();
        log::info!("The number of children nodes (from the first node) is: {}", children.len());
        log::info!(
            "The number of (sub-)children nodes (from the child nodes) is: {}",
            catalog.grandchild_count()
        );

        let branches = self.aggregator.aggregate_branches(children)?;
        let root = self.aggregator.aggregate_root(&branches)?;

        let builder = GraphBuilder::new(&self.aggregator, &self.formatter);
        let root_label = builder.root_label(&catalog.root, &root);
        log::info!("The first node is: {}", root_label);

        let graph = builder.build(&catalog.root, &root, &branches)?;

        Ok(AnalyzedTree {
            root_label,
            root,
            branches,
            graph,
        })
    }

    /// Run the whole pipeline. Nothing is written unless every stage succeeds.
    pub fn run(&self) -> AttackTreeResult<RunReport> {
        log::info!("Loading threat catalog: {}", self.config.input_path.display());
        let catalog = ThreatCatalog::load(&self.config.input_path)?;

        let tree = self.analyze(&catalog)?;

        let layout = spring_layout(&tree.graph, self.config.layout_seed);
        let renderer = SvgRenderer::from_config(&self.config);
        let document = renderer.render(&tree.graph, &layout)?;
        renderer.save(&document, &self.config.output_path)?;
        log::info!("Attack tree saved to {}", self.config.output_path.display());

        Ok(RunReport {
            branch_count: tree.branches.len(),
            leaf_count: catalog.grandchild_count(),
            node_count: tree.graph.node_count(),
            edge_count: tree.graph.edge_count(),
            root_label: tree.root_label,
            root: tree.root,
            branches: tree.branches,
            input_digest: catalog.digest,
            output_path: self.config.output_path.clone(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AttackTreeError;
    use crate::models::MonetaryAmount;
    use approx::assert_abs_diff_eq;
    use std::path::Path;
    use std::sync::{Mutex, Once};

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CapturingLogger;

    impl log::Log for CapturingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = CAPTURED.lock() {
                lines.push(format!("{} {}", record.level(), record.args()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger;

    /// Route log records of the test process into `CAPTURED`.
    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(log::LevelFilter::Debug);
        });
    }

    fn logged(line: &str) -> bool {
        CAPTURED.lock().unwrap().iter().any(|l| l == line)
    }

    fn logged_prefix(prefix: &str) -> bool {
        CAPTURED.lock().unwrap().iter().any(|l| l.starts_with(prefix))
    }

    const CATALOG: &str = include_str!("../configs/pre_digitalisation.json");

    fn config_in(dir: &Path, catalog: &str) -> Config {
        let input_path = dir.join("catalog.json");
        std::fs::write(&input_path, catalog).unwrap();
        Config {
            input_path,
            output_path: dir.join("tree.svg"),
            ..Config::default()
        }
    }

    #[test]
    fn test_run_shipped_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), CATALOG);
        let report = AttackTreePipeline::new(config.clone()).unwrap().run().unwrap();

        assert_eq!(report.root.total_monetary_amount, MonetaryAmount::Integer(16550));
        assert_abs_diff_eq!(report.root.overall_probability, 0.41, epsilon = 1e-12);
        assert_eq!(report.branch_count, 6);
        assert_eq!(report.leaf_count, 7);
        assert_eq!(report.node_count, 14);
        assert_eq!(report.edge_count, 13);
        assert_eq!(report.root_label, "Business threats: £16550(41%)");

        let svg = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(svg.matches("<circle").count(), 14);
        assert!(svg.contains("Business threats: £16550(41%)"));
        assert!(svg.contains("Leaked data: £3500(28%)"));
    }

    #[test]
    fn test_runs_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), CATALOG);
        AttackTreePipeline::new(config.clone()).unwrap().run().unwrap();
        let first = std::fs::read_to_string(&config.output_path).unwrap();
        AttackTreePipeline::new(config.clone()).unwrap().run().unwrap();
        let second = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_currency_and_precision_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), CATALOG);
        config.currency_symbol = "$".to_string();
        config.precision = 3;
        let report = AttackTreePipeline::new(config).unwrap().run().unwrap();
        assert!(report.root_label.starts_with("Business threats: $16550("));
        // mean(0.27, 0.6, 0.4, 0.28, 0.5, 0.4) at three digits
        assert_abs_diff_eq!(report.root.overall_probability, 0.408, epsilon = 1e-12);
    }

    #[test]
    fn test_invariant_violation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CATALOG.replacen("\"Combined\"", "\"Spoofing identity\"", 1);
        let config = config_in(dir.path(), &catalog);
        let err = AttackTreePipeline::new(config.clone()).unwrap().run().unwrap_err();
        assert!(matches!(err, AttackTreeError::InvariantViolation(_)));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            input_path: dir.path().join("absent.json"),
            output_path: dir.path().join("tree.svg"),
            ..Config::default()
        };
        let err = AttackTreePipeline::new(config.clone()).unwrap().run().unwrap_err();
        assert!(matches!(err, AttackTreeError::Io { .. }));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), CATALOG);
        config.output_path = dir.path().join("no-such-dir").join("tree.svg");
        let err = AttackTreePipeline::new(config).unwrap().run().unwrap_err();
        assert!(matches!(err, AttackTreeError::Io { path: Some(_), .. }));
    }

    #[test]
    fn test_analyze_branch_labels() {
        let catalog = ThreatCatalog::from_slice(CATALOG.as_bytes()).unwrap();
        let tree = AttackTreePipeline::new(Config::default()).unwrap().analyze(&catalog).unwrap();
        let labels: Vec<&str> = tree
            .branches
            .iter()
            .map(|b| tree.graph.vertex(b.id).unwrap().label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Spoofed identities: £1800(27%)",
                "Loss of delivery data: £2000(60%)",
                "Unidentified users: £1250(40%)",
                "Leaked data: £3500(28%)",
                "PC's unavailability: £3000(50%)",
                "Compromised data: £5000(40%)",
            ]
        );
    }

    #[test]
    fn test_diagnostics_are_logged() {
        capture_logs();
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), CATALOG);
        AttackTreePipeline::new(config).unwrap().run().unwrap();

        assert!(logged("INFO The number of children nodes (from the first node) is: 6"));
        assert!(logged("INFO The number of (sub-)children nodes (from the child nodes) is: 7"));
        assert!(logged("INFO The first node is: Business threats: £16550(41%)"));
    }

    #[test]
    fn test_root_invariant_warning_is_logged() {
        capture_logs();
        let dir = tempfile::tempdir().unwrap();
        let catalog = CATALOG.replacen("\"Combined\"", "\"Denial of service\"", 1);
        let config = config_in(dir.path(), &catalog);
        let err = AttackTreePipeline::new(config).unwrap().run().unwrap_err();

        assert!(matches!(err, AttackTreeError::InvariantViolation(_)));
        assert!(logged_prefix(
            "WARN The first node has not been defined correctly: expected id '1' and category 'Combined', found id '1' and category 'Denial of service'"
        ));
    }

    #[test]
    fn test_precision_out_of_range_is_rejected() {
        let config = Config {
            precision: 400,
            ..Config::default()
        };
        assert!(matches!(
            AttackTreePipeline::new(config),
            Err(AttackTreeError::InvalidConfig(_))
        ));
    }
}
