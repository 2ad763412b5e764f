use std::path::{Path, PathBuf};

use argh::FromArgs;
use log::{info, warn};
use rayon::prelude::*;
use recog_cli::recog_core::Image;
use recog_cli::{init_thread_pool, io, HypothesisRecord, Recognition, Recognizer, RecognizerConfig, RecogResult};

/// Find an object in one or more scene images
#[derive(Debug, FromArgs)]
struct Args {
    /// object image path
    #[argh(positional)]
    object: PathBuf,

    /// scene image paths
    #[argh(positional)]
    scenes: Vec<PathBuf>,

    /// recognizer configuration (.json or .toml)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// override the matcher's distance ratio threshold
    #[argh(option, short = 'r')]
    ratio: Option<f32>,

    /// directory for hypothesis records and renders
    #[argh(option, short = 'o', default = "PathBuf::from(\"recog-out\")")]
    output: PathBuf,

    /// also write keypoint and match visualizations
    #[argh(switch)]
    render: bool,

    /// worker threads (defaults to the configured count, then the CPU count)
    #[argh(option, short = 't')]
    threads: Option<usize>,
}

/// Persist what was found in one scene.
fn write_outputs(
    args: &Args,
    object: &Image,
    index: usize,
    scene_path: &Path,
    scene: &Image,
    recognition: &Recognition,
) -> RecogResult<()> {
    let name = io::output_name(index, scene_path);
    if args.render {
        io::render_keypoints(scene, &recognition.features.points)?
            .save(args.output.join(format!("{name}_keypoints.png")))?;
        io::render_matches(object, scene, &recognition.matches, &recognition.hypothesis)?
            .save(args.output.join(format!("{name}_matches.png")))?;
    }
    if recognition.hypothesis.is_found() {
        let record = HypothesisRecord::new(
            args.object.display().to_string(),
            scene_path.display().to_string(),
            &recognition.hypothesis,
        )?;
        record.save(args.output.join(format!("{name}.toml")))?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => RecognizerConfig::load(path)?,
        None => RecognizerConfig::default(),
    };
    if let Some(ratio) = args.ratio {
        config.matcher.ratio_threshold = ratio;
    }
    let threads = args.threads.or(config.threads).unwrap_or_else(num_cpus::get);
    init_thread_pool(threads)?;

    let recognizer = Recognizer::new(config)?;
    info!(
        "{} | {} | ratio {} | {} threads",
        recognizer.config().detector.summary(),
        recognizer.config().descriptor.kind.name(),
        recognizer.config().matcher.ratio_threshold,
        threads
    );

    std::fs::create_dir_all(&args.output)?;
    let object_image = io::load(&args.object)?;
    let object = recognizer.describe(&object_image)?;
    info!(
        "{}: {} features",
        args.object.display(),
        object.descriptors.len()
    );
    if args.render {
        io::render_keypoints(&object_image, &object.points)?
            .save(args.output.join(format!("object_{}_keypoints.png", io::stem(&args.object))))?;
    }

    let found = args
        .scenes
        .par_iter()
        .enumerate()
        .filter(|(index, scene_path)| {
            let outcome = io::load(scene_path).and_then(|scene| {
                let recognition = recognizer.recognize_scene(&object, &scene)?;
                write_outputs(&args, &object_image, *index, scene_path, &scene, &recognition)?;
                Ok(recognition.hypothesis)
            });
            match outcome {
                Ok(hypothesis) if hypothesis.is_found() => {
                    let t = hypothesis.transform.unwrap_or_default();
                    info!(
                        "{}: found (p = {:.2}, scale {:.2}, rotation {:.1} deg, t = ({:.1}, {:.1}))",
                        scene_path.display(),
                        hypothesis.probability,
                        t.scale,
                        t.rotation.to_degrees(),
                        t.tx,
                        t.ty
                    );
                    true
                }
                Ok(_) => {
                    info!("{}: not found", scene_path.display());
                    false
                }
                Err(e) => {
                    warn!("{}: skipped: {}", scene_path.display(), e);
                    false
                }
            }
        })
        .count();

    info!("object found in {} of {} scenes", found, args.scenes.len());
    Ok(())
}
