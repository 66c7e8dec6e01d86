use clap::{Parser, Subcommand};
use sequence_core::sections::{ConfiguredSection, FixedSection};
use sequence_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "seqplan")]
#[command(about = "Session sequencing planner with QA reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Movement catalog JSON file (defaults to the built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a session and print its QA report
    Plan {
        /// Target class length in minutes
        #[arg(long, conflicts_with = "request")]
        minutes: Option<u32>,

        /// Difficulty tier (beginner, intermediate, advanced)
        #[arg(long, default_value = "beginner")]
        difficulty: String,

        /// Focus area to weight selection toward (repeatable)
        #[arg(long = "focus")]
        focus: Vec<String>,

        /// Movement id that must appear (repeatable)
        #[arg(long = "require")]
        require: Vec<String>,

        /// Movement id that must never appear (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Number of recovery movements to append
        #[arg(long, default_value_t = 0)]
        cooldown: usize,

        /// Read the request from a JSON file instead of flags
        #[arg(long)]
        request: Option<PathBuf>,

        /// Fixed section overhead in seconds, replacing the configured sections
        #[arg(long)]
        overhead_seconds: Option<u32>,

        /// Emit the report as JSON instead of markdown
        #[arg(long)]
        json: bool,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Reject plans with surviving overlap or progression findings
        #[arg(long)]
        strict: bool,
    },

    /// List the catalog and check it for problems
    Catalog,
}

/// Options for the plan command, gathered from flags
struct PlanArgs {
    minutes: Option<u32>,
    difficulty: String,
    focus: Vec<String>,
    require: Vec<String>,
    exclude: Vec<String>,
    cooldown: usize,
    request: Option<PathBuf>,
    overhead_seconds: Option<u32>,
    json: bool,
    output: Option<PathBuf>,
    strict: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    sequence_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let catalog_path = cli.catalog.clone().or_else(|| config.catalog.path.clone());
    let catalog = load_catalog(catalog_path.as_deref())?;

    match cli.command {
        Commands::Plan {
            minutes,
            difficulty,
            focus,
            require,
            exclude,
            cooldown,
            request,
            overhead_seconds,
            json,
            output,
            strict,
        } => cmd_plan(
            PlanArgs {
                minutes,
                difficulty,
                focus,
                require,
                exclude,
                cooldown,
                request,
                overhead_seconds,
                json,
                output,
                strict,
            },
            &catalog,
            &config,
        ),
        Commands::Catalog => cmd_catalog(&catalog),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::load_from(path)?,
        None => get_default_catalog().clone(),
    };

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    Ok(catalog)
}

fn build_request(args: &PlanArgs) -> Result<SequenceRequest> {
    if let Some(path) = &args.request {
        return SequenceRequest::load_from(path);
    }

    let minutes = args.minutes.ok_or_else(|| {
        Error::InvalidRequest("either --minutes or --request is required".into())
    })?;

    let mut request = SequenceRequest::new(minutes, args.difficulty.parse()?);
    request.focus_areas = args.focus.iter().cloned().collect();
    request.required_movements = args.require.clone();
    request.excluded_movements = args.exclude.iter().cloned().collect();
    request.cooldown_movements = args.cooldown;
    Ok(request)
}

fn cmd_plan(args: PlanArgs, catalog: &Catalog, config: &Config) -> Result<()> {
    let request = build_request(&args)?;

    let mut planner = config.planner.clone();
    if args.strict {
        planner.overlap_violations = ViolationPolicy::Reject;
        planner.progression_violations = ViolationPolicy::Reject;
    }

    // Section durations come from their providers, never from constants here
    let configured = ConfiguredSection::from_configs(&config.sections);
    let fixed = args
        .overhead_seconds
        .map(|seconds| FixedSection::new("overhead", seconds));
    let sections: Vec<&dyn SectionProvider> = match &fixed {
        Some(section) => vec![section as &dyn SectionProvider],
        None => configured.iter().map(|s| s as &dyn SectionProvider).collect(),
    };

    let plan = build_sequence(&request, catalog, &sections, &planner)?;
    let report = report::generate_with_threshold(&plan, planner.overlap_threshold);

    let rendered = if args.json {
        report.to_json()?
    } else {
        report.to_markdown()?
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &rendered)?;
            println!(
                "✓ Planned {} movements ({}s of {}s target)",
                plan.movements.len(),
                plan.total_seconds(),
                plan.target_seconds
            );
            println!("  Report: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if !report.is_clean() {
        eprintln!("Plan has QA findings; see the report for details.");
    }

    Ok(())
}

fn cmd_catalog(catalog: &Catalog) -> Result<()> {
    println!(
        "{:<24} {:<34} {:<13} {:<10} {:>5}  MUSCLE GROUPS",
        "ID", "NAME", "DIFFICULTY", "PATTERN", "SECS"
    );
    for m in &catalog.movements {
        let pattern = m
            .pattern
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<24} {:<34} {:<13} {:<10} {:>5}  {}",
            m.id,
            m.name,
            m.difficulty.to_string(),
            pattern,
            m.duration_seconds,
            m.muscle_groups.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let gaps = catalog.incomplete();
    for gap in &gaps {
        eprintln!("warning: '{}' is missing {:?}", gap.movement_id, gap.missing);
    }

    println!();
    println!("✓ {} movements, catalog valid", catalog.movements.len());
    Ok(())
}
