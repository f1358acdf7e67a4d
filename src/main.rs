use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use vfmap::config::{DEFAULT_BASE_AMOUNT, DEFAULT_RANGE_PERCENT, FileConfig};
use vfmap::io::{read_cells, read_fields, write_map};
use vfmap::mesh::{GridOrigin, GridRounding, MeshOptions};
use vfmap::raster::{GridFileSource, HttpRasterSource, RasterSource, RetryOnce};
use vfmap::vfm::pipeline::DEFAULT_GRID_M;
use vfmap::{
    ApplicationParameters, DistributionMode, FieldPlan, PlanOptions, VfmMap, plan_field,
    update_vfm,
};

/// Generate variable-rate fertilization maps from a field boundary and a humus raster
///
/// Examples:
///   # 20 m grid over a field, humus from a local grid file
///   vfmap --field field.geojson --raster-file humus.json
///
///   # 10 m x 30 m cells, 5 m buffer, stepless rates around 80 kg
///   vfmap --field field.geojson --raster-url https://example.org/humus \
///         --grid-ew 10 --grid-ns 30 --buffer 5 --base-amount 80 --stepless
///
///   # Re-rate an existing map without sampling again
///   vfmap --from map.geojson --base-amount 120 --range 30 -o map-120.geojson
#[derive(Parser, Debug)]
#[command(name = "vfmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches vfmap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field boundary as GeoJSON (Feature, FeatureCollection or Polygon)
    #[arg(short = 'f', long, required_unless_present = "from")]
    field: Option<PathBuf>,

    /// Pick the field with this id when the file holds several
    #[arg(long)]
    field_id: Option<String>,

    /// Humus raster as a JSON grid file
    #[arg(long, conflicts_with = "raster_url")]
    raster_file: Option<PathBuf>,

    /// Humus raster service URL
    #[arg(long)]
    raster_url: Option<String>,

    /// Raster band to read
    #[arg(long)]
    band: Option<usize>,

    /// Cell length east-west in meters (minimum 10)
    #[arg(long, default_value = "20.0")]
    grid_ew: f64,

    /// Cell length north-south in meters (minimum 10)
    #[arg(long, default_value = "20.0")]
    grid_ns: f64,

    /// Grow the field outward by this many meters before meshing
    #[arg(long, default_value = "0.0")]
    buffer: f64,

    /// Grid corner to start from: nw or se
    #[arg(long, default_value = "nw")]
    origin: GridOrigin,

    /// Cell count per axis: floor (last cell larger) or ceil (last cell partial)
    #[arg(long, default_value = "floor")]
    rounding: GridRounding,

    /// Grid rotation in degrees (defaults to the minimal bounding box)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=90))]
    rotation: Option<u32>,

    /// Base fertilization amount per 1000 m²
    #[arg(short = 'b', long, default_value = "100.0")]
    base_amount: f64,

    /// Adjustment range in percent (0-100)
    #[arg(short = 'r', long, default_value = "20.0")]
    range: f64,

    /// Continuous rates instead of five steps
    #[arg(long)]
    stepless: bool,

    /// Leave cells without humus data at zero instead of the base amount
    #[arg(long)]
    no_interpolation: bool,

    /// Refuse grids with more cells than this
    #[arg(long)]
    max_cells: Option<usize>,

    /// Output GeoJSON path (defaults to {field id}.geojson or vfm.geojson)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Recompute rates for a previously written map instead of sampling
    #[arg(long)]
    from: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            FileConfig::from_path(config_path)
                .context(format!("Failed to load config file: {:?}", config_path))?
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load().unwrap_or_default()
    };

    let verbose = args.verbose || file_config.verbose;
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    let grid_ew = if args.grid_ew != DEFAULT_GRID_M {
        args.grid_ew
    } else {
        file_config.grid_ew
    };
    let grid_ns = if args.grid_ns != DEFAULT_GRID_M {
        args.grid_ns
    } else {
        file_config.grid_ns
    };
    let buffer = if args.buffer != 0.0 {
        args.buffer
    } else {
        file_config.buffer
    };
    let origin = if args.origin != GridOrigin::NorthWest {
        args.origin
    } else {
        file_config.origin
    };
    let rounding = if args.rounding != GridRounding::Floor {
        args.rounding
    } else {
        file_config.rounding
    };
    let max_cells = args.max_cells.or(file_config.max_cells);
    let base_amount = if args.base_amount != DEFAULT_BASE_AMOUNT {
        args.base_amount
    } else {
        file_config.base_amount
    };
    let range = if args.range != DEFAULT_RANGE_PERCENT {
        args.range
    } else {
        file_config.range
    };
    let stepless = args.stepless || !file_config.five_steps;
    let interpolate = !args.no_interpolation && file_config.interpolate_missing;

    let raster_config = file_config.raster();
    let band = args.band.unwrap_or(raster_config.band);
    let output = args.output.clone().or_else(|| file_config.output.clone());

    if !(0.0..=100.0).contains(&range) {
        bail!("--range must be between 0 and 100, got {}", range);
    }
    if !(base_amount > 0.0) {
        bail!("--base-amount must be positive, got {}", base_amount);
    }
    if buffer < 0.0 {
        bail!("--buffer must not be negative, got {}", buffer);
    }

    let mode = if stepless {
        DistributionMode::Stepless
    } else {
        DistributionMode::Steps
    };
    let params = ApplicationParameters::new(base_amount, range)
        .with_mode(mode)
        .with_interpolation(interpolate);

    println!("vfmap - Variable-Rate Fertilization Map Generator");
    println!("=================================================");
    println!();

    if verbose {
        println!("Configuration:");
        println!("  Grid: {}m x {}m ({:?}, {:?})", grid_ew, grid_ns, origin, rounding);
        println!("  Buffer: {}m", buffer);
        println!("  Base amount: {}", base_amount);
        println!("  Range: {}%", range);
        println!("  Distribution: {:?}", mode);
        println!("  Interpolate missing: {}", interpolate);
        if let Some(limit) = max_cells {
            println!("  Max cells: {}", limit);
        }
        println!();
    }

    if let Some(ref from) = args.from {
        let spinner = create_spinner("Reading previous map...");
        let start = Instant::now();
        let cells = read_cells(from).context(format!("Failed to read map {:?}", from))?;
        spinner.finish_with_message(format!(
            "Read {} cells [{:.1}s]",
            cells.len(),
            start.elapsed().as_secs_f32()
        ));

        let map = update_vfm(&cells, &params);
        let output_path = output.unwrap_or_else(|| PathBuf::from("vfm.geojson"));
        write_output(&output_path, &map)?;

        println!();
        print_map_summary(&map);
        println!();
        println!(
            "Done! Total time: {:.1}s",
            total_start.elapsed().as_secs_f32()
        );
        println!("Output: {}", output_path.display());
        return Ok(());
    }

    let Some(ref field_path) = args.field else {
        bail!("Must provide --field or --from");
    };

    let spinner = create_spinner("Reading field boundary...");
    let fields = read_fields(field_path).context(format!("Failed to read field {:?}", field_path))?;
    let field = match args.field_id {
        Some(ref id) => fields
            .into_iter()
            .find(|f| f.id.as_deref() == Some(id.as_str()))
            .with_context(|| format!("No field with id {:?} in {:?}", id, field_path))?,
        None => fields
            .into_iter()
            .next()
            .context("Field file contains no polygon")?,
    };
    spinner.finish_with_message(format!(
        "Field {}: {:.1} a",
        field.id.as_deref().unwrap_or("(unnamed)"),
        field.area_are()
    ));

    let raster_file = args.raster_file.clone().or(raster_config.file.clone());
    let raster_url = args.raster_url.clone().or(raster_config.url.clone());
    let timeout = Duration::from_secs(raster_config.timeout_secs);

    let source: Box<dyn RasterSource> = match (raster_url, raster_file) {
        (Some(url), _) => {
            let primary = HttpRasterSource::new(url.clone(), timeout)
                .context("Failed to build raster client")?;
            let fallback = HttpRasterSource::new(url, timeout * 2)
                .context("Failed to build raster client")?;
            Box::new(RetryOnce::new(primary, fallback))
        }
        (None, Some(path)) => Box::new(GridFileSource::new(path)),
        (None, None) => bail!("Must provide --raster-file or --raster-url (or [raster] in the config)"),
    };

    let options = PlanOptions::new(params)
        .with_grid(grid_ew, grid_ns)
        .with_buffer(buffer)
        .with_rotation(args.rotation)
        .with_mesh(MeshOptions {
            origin,
            rounding,
            max_cells,
        })
        .with_band(band);

    let spinner = create_spinner("Building grid, sampling humus and computing rates...");
    let start = Instant::now();
    let plan = plan_field(&field, source.as_ref(), &options).context("Failed to build map")?;
    spinner.finish_with_message(format!(
        "Built {} cells [{:.1}s]",
        plan.map.cell_count(),
        start.elapsed().as_secs_f32()
    ));

    let output_path = output.unwrap_or_else(|| match field.id {
        Some(ref id) => PathBuf::from(format!("{}.geojson", id.replace(' ', "_"))),
        None => PathBuf::from("vfm.geojson"),
    });
    write_output(&output_path, &plan.map)?;

    println!();
    print_plan_summary(&plan);
    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    println!("Output: {}", output_path.display());

    Ok(())
}

fn write_output(path: &std::path::Path, map: &VfmMap) -> Result<()> {
    let spinner = create_spinner("Writing GeoJSON...");
    let start = Instant::now();
    write_map(path, map).context("Failed to write map")?;
    spinner.finish_with_message(format!(
        "Wrote {} cells [{:.1}s]",
        map.cell_count(),
        start.elapsed().as_secs_f32()
    ));
    Ok(())
}

fn print_plan_summary(plan: &FieldPlan) {
    println!("Grid");
    println!("====");
    println!("  Rotation: {} deg", plan.rotation_deg);
    println!("  Cells:    {}", plan.report.summary());
    for warning in &plan.report.warnings {
        println!("  Warning:  {}", warning);
    }
    match plan.stats {
        Ok(stats) => println!(
            "  Humus:    mean {} / std-dev {}",
            stats.mean, stats.std_dev
        ),
        Err(reason) => println!("  Humus:    {}", reason),
    }
    println!();
    print_map_summary(&plan.map);
}

fn print_map_summary(map: &VfmMap) {
    let with_data = map.cells.iter().filter(|c| c.has_humus()).count();

    println!("Application");
    println!("===========");
    println!(
        "  Cells with humus data: {} of {}",
        with_data,
        map.cell_count()
    );
    println!("  Fertilized area:       {:.1} m²", map.area_sum);
    println!("  Total amount:          {:.2}", map.amount_sum);
    if let Some(rate) = map.mean_rate() {
        println!("  Mean rate:             {:.1} per 1000 m²", rate);
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
