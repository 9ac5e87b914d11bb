use std::path::PathBuf;

use argh::FromArgs;
use log::{info, warn};

use ricegrid::{
    preset::{JsonPresetStore, PresetStore},
    preview::{make_preview, DEFAULT_MAX_SIZE},
    ClusterNaming, CropJob, CropRequest, CropResponse, DatedNaming, ExecutionStrategy,
    GridConfig, GroupDirection, Point2, PreviewGeometry,
};

#[derive(FromArgs, Debug)]
/// Rectify skewed rice-cluster scans and slice them into numbered patches.
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    Crop(CropArgs),
    Preview(PreviewArgs),
}

#[derive(FromArgs, Debug)]
/// Run a crop job.
#[argh(subcommand, name = "crop")]
struct CropArgs {
    /// path to a JSON crop request, flags below override its fields
    #[argh(option, short = 'r')]
    request: Option<PathBuf>,

    /// path to the source image
    #[argh(option, short = 'i')]
    image: Option<PathBuf>,

    /// reference points in preview space as x1,y1,x2,y2,x3,y3
    #[argh(option, from_str_fn(parse_points))]
    points: Option<[Point2; 3]>,

    /// size of the preview the points were picked on, as WxH
    #[argh(option, from_str_fn(parse_size))]
    preview_size: Option<PreviewGeometry>,

    /// output directory
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// date tag used in file names
    #[argh(option)]
    date: Option<String>,

    /// name or id of a saved preset providing the grid
    #[argh(option)]
    preset: Option<String>,

    /// path to the preset store
    #[argh(option, default = "PathBuf::from(\"presets.json\")")]
    presets: PathBuf,

    /// save the resulting grid as a preset with this name
    #[argh(option)]
    save_preset: Option<String>,

    /// cell rows per group
    #[argh(option)]
    rows: Option<i64>,

    /// cell columns per group
    #[argh(option)]
    cols: Option<i64>,

    /// number of groups
    #[argh(option)]
    groups: Option<i64>,

    /// margin in preview pixels
    #[argh(option)]
    margin: Option<f64>,

    /// gap between rows in preview pixels
    #[argh(option)]
    row_gap: Option<f64>,

    /// gap between columns in preview pixels
    #[argh(option)]
    col_gap: Option<f64>,

    /// gap between groups in preview pixels
    #[argh(option)]
    group_gap: Option<f64>,

    /// side of a patch in pixels
    #[argh(option)]
    patch_size: Option<i64>,

    /// stack groups vertically
    #[argh(switch)]
    vertical: bool,

    /// cluster number of the first cell
    #[argh(option)]
    start_number: Option<i64>,

    /// file naming: "dated" (default) or "cluster"
    #[argh(option, default = "String::from(\"dated\")")]
    naming: String,

    /// number of worker threads, all cores when unset
    #[argh(option, short = 'n')]
    threads: Option<usize>,

    /// print the response as JSON
    #[argh(switch)]
    json: bool,
}

#[derive(FromArgs, Debug)]
/// Write a downscaled preview of an image.
#[argh(subcommand, name = "preview")]
struct PreviewArgs {
    /// path to the source image
    #[argh(option, short = 'i')]
    image: PathBuf,

    /// path of the preview to write (png)
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// longest side of the preview
    #[argh(option, default = "DEFAULT_MAX_SIZE")]
    max_size: usize,
}

fn parse_points(value: &str) -> Result<[Point2; 3], String> {
    let coords = value
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match coords[..] {
        [x1, y1, x2, y2, x3, y3] => Ok([
            Point2::new(x1, y1),
            Point2::new(x2, y2),
            Point2::new(x3, y3),
        ]),
        _ => Err(format!("expected 6 coordinates, got {}", coords.len())),
    }
}

fn parse_size(value: &str) -> Result<PreviewGeometry, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {value}"))?;
    let w = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(PreviewGeometry::new(w, h))
}

fn grid_config(args: &CropArgs, base: GridConfig) -> GridConfig {
    let mut config = base;
    config.rows = args.rows.unwrap_or(config.rows);
    config.cols = args.cols.unwrap_or(config.cols);
    config.groups = args.groups.unwrap_or(config.groups);
    config.margin = args.margin.unwrap_or(config.margin);
    config.row_gap = args.row_gap.unwrap_or(config.row_gap);
    config.col_gap = args.col_gap.unwrap_or(config.col_gap);
    config.group_gap = args.group_gap.unwrap_or(config.group_gap);
    config.patch_size = args.patch_size.unwrap_or(config.patch_size);
    config.start_number = args.start_number.unwrap_or(config.start_number);
    if args.vertical {
        config.group_direction = GroupDirection::Vertical;
    }
    config
}

fn build_request(args: &CropArgs) -> Result<CropRequest, Box<dyn std::error::Error>> {
    let store = JsonPresetStore::new(&args.presets);

    let base = match &args.request {
        Some(path) => Some(serde_json::from_reader::<_, CropRequest>(
            std::io::BufReader::new(std::fs::File::open(path)?),
        )?),
        None => None,
    };

    let config = match (&args.preset, &base) {
        (Some(name), _) => store.find(name)?.config,
        (None, Some(request)) => request.config.clone(),
        (None, None) => GridConfig::default(),
    };

    let path = args
        .image
        .clone()
        .or_else(|| base.as_ref().map(|r| r.path.clone()))
        .ok_or("an image is required, pass --image or --request")?;
    let clicks = args
        .points
        .or_else(|| base.as_ref().map(|r| r.clicks))
        .ok_or("reference points are required, pass --points or --request")?;
    let preview_size = args
        .preview_size
        .or_else(|| base.as_ref().map(|r| r.preview_size))
        .ok_or("the preview size is required, pass --preview-size or --request")?;

    Ok(CropRequest {
        path,
        save_path: args
            .output
            .clone()
            .or_else(|| base.as_ref().and_then(|r| r.save_path.clone())),
        custom_date: args
            .date
            .clone()
            .or_else(|| base.as_ref().and_then(|r| r.custom_date.clone())),
        clicks,
        preview_size,
        config: grid_config(args, config),
    })
}

fn run_crop(args: CropArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(&args)?;

    if let Some(name) = &args.save_preset {
        let store = JsonPresetStore::new(&args.presets);
        let id = store.load()?.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        store.insert(ricegrid::preset::Preset {
            id,
            name: name.clone(),
            config: request.config.clone(),
        })?;
        info!("saved preset '{name}' to {}", store.path().display());
    }

    let strategy = match args.threads {
        None => ExecutionStrategy::Parallel,
        Some(1) => ExecutionStrategy::Serial,
        Some(n) => ExecutionStrategy::Fixed(n),
    };

    let job = CropJob::new(request).with_strategy(strategy).with_progress(|p| {
        info!(
            "cell {}/{} ({} patches)",
            p.cells_done, p.cells_total, p.patches_written
        )
    });

    let job = match args.naming.as_str() {
        "dated" => job.with_naming(DatedNaming),
        "cluster" => job.with_naming(ClusterNaming),
        other => return Err(format!("unknown naming '{other}', use dated or cluster").into()),
    };

    let result = job.run();
    if let Err(err) = &result {
        warn!("crop job failed ({})", err.kind());
    }
    let response = CropResponse::from(result);

    if args.json {
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", response.message);
    }

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let preview = make_preview(&args.image, args.max_size)?;
    preview.image.write(&args.output)?;

    println!(
        "{}",
        serde_json::json!({
            "path": args.image,
            "preview": args.output,
            "orig_w": preview.orig_w,
            "orig_h": preview.orig_h,
            "preview_w": preview.preview_w,
            "preview_h": preview.preview_h,
        })
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    match args.command {
        Command::Crop(args) => run_crop(args),
        Command::Preview(args) => run_preview(args),
    }
}
