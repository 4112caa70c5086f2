use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use foundation::color::Rgba;
use foundation::math::LngLat;
use formats::Dataset;
use layers::BUILDING_TYPE_CATEGORIES;
use scene::{ColourMode, HeightRange, LayerId, LayerToggle, RawPick};
use tools::{Session, ViewerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and exercise an urban 3-D map dataset")]
struct Args {
    /// Dataset directory (buildings.geojson, roads.geojson, ...)
    #[arg(long, env = "URBAN3D_DATA", default_value = "data")]
    data: PathBuf,

    /// Viewer config JSON; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print dataset metadata and recomputed statistics
    Inspect {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compose the layer stack and list the descriptors
    Layers {
        #[arg(long, value_enum, default_value_t = Mode::Height)]
        colour_mode: Mode,

        #[arg(long)]
        min_height: Option<f64>,

        #[arg(long)]
        max_height: Option<f64>,

        #[arg(long)]
        wireframe: bool,

        /// Layers to switch off (buildings, roads, pois, landmarks)
        #[arg(long, value_delimiter = ',')]
        hide: Vec<String>,

        /// Reload symbology from this config after the first compose
        #[arg(long)]
        restyle: Option<PathBuf>,
    },
    /// Resolve a pick as a click and report selection and tooltip
    Pick {
        /// Layer id, e.g. buildings-solid or pois
        #[arg(long)]
        layer: String,

        #[arg(long)]
        index: usize,

        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        #[arg(long, requires = "lon")]
        lat: Option<f64>,
    },
    /// Simulate a fly-to at a fixed frame rate and print the camera path
    Fly {
        #[arg(long)]
        lon: f64,

        #[arg(long)]
        lat: f64,

        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Print every Nth frame
        #[arg(long, default_value_t = 10)]
        every: u64,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Height,
    Type,
}

impl From<Mode> for ColourMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Height => ColourMode::Height,
            Mode::Type => ColourMode::Type,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let dataset = load_dataset(&args.data)?;

    match args.command {
        Command::Inspect { json } => cmd_inspect(&dataset, json),
        Command::Layers {
            colour_mode,
            min_height,
            max_height,
            wireframe,
            hide,
            restyle,
        } => {
            let mut session = Session::from_dataset(&config, &dataset);
            let store = session.store_mut();
            store.set_colour_mode(colour_mode.into());
            store.set_toggle(LayerToggle::Wireframe, wireframe);
            for name in &hide {
                store.set_toggle(parse_toggle(name)?, false);
            }
            if min_height.is_some() || max_height.is_some() {
                let full = HeightRange::FULL;
                store.set_height_range(HeightRange::new(
                    min_height.unwrap_or(full.min()),
                    max_height.unwrap_or(full.max()),
                ));
            }
            cmd_layers(&mut session, restyle.as_deref())
        }
        Command::Pick {
            layer,
            index,
            lon,
            lat,
        } => {
            let mut session = Session::from_dataset(&config, &dataset);
            let coordinate = lon.zip(lat).map(|(lon, lat)| LngLat::new(lon, lat));
            cmd_pick(&mut session, layer, index, coordinate)
        }
        Command::Fly {
            lon,
            lat,
            fps,
            every,
        } => {
            let mut session = Session::from_dataset(&config, &dataset);
            cmd_fly(&mut session, LngLat::new(lon, lat), fps, every)
        }
    }
}

fn load_dataset(dir: &Path) -> Result<Dataset> {
    let dataset = Dataset::load(dir)
        .with_context(|| format!("loading dataset from {}", dir.display()))?;
    if dataset.skipped.total() > 0 {
        info!(skipped = dataset.skipped.total(), "some features were skipped");
    }
    Ok(dataset)
}

fn parse_toggle(name: &str) -> Result<LayerToggle> {
    LayerToggle::ALL
        .into_iter()
        .find(|t| t.as_str() == name)
        .with_context(|| format!("unknown layer toggle: {name}"))
}

fn cmd_inspect(dataset: &Dataset, json: bool) -> Result<()> {
    let stats = dataset.stats();
    if json {
        let out = serde_json::json!({
            "root": dataset.root().display().to_string(),
            "fingerprint": dataset.fingerprint(),
            "metadata": dataset.metadata,
            "stats": stats,
            "pois": dataset.pois.as_ref().map(|p| p.len()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("dataset:      {}", dataset.root().display());
    println!("city:         {}", dataset.city().unwrap_or("(unknown)"));
    if let Some(generated_at) = dataset.metadata.as_ref().and_then(|m| m.generated_at.as_deref())
    {
        println!("generated at: {generated_at}");
    }
    println!("fingerprint:  {}", dataset.fingerprint());
    println!("buildings:    {}", stats.buildings_count);
    println!("roads:        {}", stats.roads_count);
    match &dataset.pois {
        Some(pois) => println!("pois:         {}", pois.len()),
        None => println!("pois:         (none)"),
    }
    if let Some(avg) = stats.avg_building_height {
        println!("avg height:   {avg:.1} m");
    }
    if let Some(max) = stats.max_building_height {
        println!("max height:   {max:.1} m");
    }
    if let Some(pct) = stats.pct_known_height {
        println!("known height: {pct:.1}%");
    }
    for (source, count) in &stats.height_sources {
        println!("  {source:<10} {count}");
    }
    if dataset.skipped.total() > 0 {
        println!(
            "skipped:      {} buildings, {} roads, {} pois",
            dataset.skipped.buildings, dataset.skipped.roads, dataset.skipped.pois
        );
    }
    Ok(())
}

fn cmd_layers(session: &mut Session, restyle: Option<&Path>) -> Result<()> {
    session.advance(0.0);
    if let Some(path) = restyle {
        let reloaded = ViewerConfig::load(path)?;
        session.reload_symbology(&reloaded);
    }
    let range = session.store().height_range();
    println!(
        "colour mode {}, height range [{}, {}]",
        session.store().colour_mode(),
        range.min(),
        range.max()
    );
    for d in session.layers() {
        println!(
            "{:<20} features={:<6} pickable={}",
            d.id.as_str(),
            d.len(),
            d.pickable
        );
    }
    let stats = session.composer().stats();
    println!("rebuilt={} reused={}", stats.rebuilt, stats.reused);

    println!("legend:");
    match session.store().colour_mode() {
        ColourMode::Height => {
            for (height, color) in session.composer().symbology().height_scale.stops() {
                println!("  {:>6} m  {}", height, hex(*color));
            }
        }
        ColourMode::Type => {
            for (label, color) in BUILDING_TYPE_CATEGORIES {
                println!("  {label:<14} {}", hex(color));
            }
        }
    }
    Ok(())
}

fn hex(c: Rgba) -> String {
    format!("#{:02x}{:02x}{:02x}{:02x}", c.r(), c.g(), c.b(), c.a())
}

fn cmd_pick(
    session: &mut Session,
    layer: String,
    index: usize,
    coordinate: Option<LngLat>,
) -> Result<()> {
    if layer.parse::<LayerId>().is_err() {
        bail!("unknown layer id: {layer}");
    }
    let raw = RawPick {
        x: 0.0,
        y: 0.0,
        coordinate,
        layer_id: Some(layer),
        index: Some(index),
    };

    if let Some(tooltip) = session.hover(&raw) {
        if let Some(title) = &tooltip.title {
            println!("{title}");
        }
        for row in &tooltip.rows {
            println!("  {row}");
        }
    } else {
        println!("nothing picked");
    }

    let outcome = session.click(&raw);
    println!("click: {outcome:?}");
    println!("selection: {}", session.store().selection().kind());
    if let Some(flight) = session.camera().active() {
        println!(
            "fly-to: {:.2} s over {:.0} m",
            flight.duration_s(),
            flight.great_circle_m()
        );
    }
    Ok(())
}

fn cmd_fly(session: &mut Session, target: LngLat, fps: f64, every: u64) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("--fps must be a positive number");
    }
    if !session.fly_to(target) {
        bail!("invalid fly-to target");
    }

    let dt = 1.0 / fps;
    let every = every.max(1);
    let mut frames = 0u64;
    while session.camera().is_transitioning() {
        session.advance(dt);
        frames += 1;
        if frames % every == 0 || !session.camera().is_transitioning() {
            let v = session.store().view_state();
            println!(
                "{:>6.2}s lon={:.5} lat={:.5} zoom={:.2} pitch={:.1} bearing={:.1}",
                frames as f64 * dt,
                v.longitude,
                v.latitude,
                v.zoom,
                v.pitch,
                v.bearing
            );
        }
    }
    println!("settled after {frames} frames");
    Ok(())
}
