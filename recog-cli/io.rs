//! Image files, visualizations and hypothesis records.

use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use log::debug;
use recog_core::{Image, Point};
use recog_describe::Match;
use recog_pose::{Hypothesis, Transform2d};
use serde::{Deserialize, Serialize};

use crate::config::extension;
use crate::error::{RecogError, RecogResult};

const KEYPOINT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const MATCH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Read any format `image` understands as a single-channel image in `[0, 1]`.
pub fn load<P: AsRef<Path>>(path: P) -> RecogResult<Image> {
    let gray = image::open(path.as_ref())?.to_luma32f();
    let (width, height) = gray.dimensions();
    let image = Image::from_vec(height as usize, width as usize, 1, gray.into_raw())?;
    debug!("loaded {} ({}x{})", path.as_ref().display(), width, height);
    Ok(image)
}

/// 8-bit grayscale copy of `image`; samples are clamped to `[0, 1]` first.
pub fn to_gray8(image: &Image) -> RecogResult<GrayImage> {
    let gray = if image.channels() == 1 {
        image.clone()
    } else {
        image.to_grayscale()?
    };
    Ok(GrayImage::from_fn(gray.width() as u32, gray.height() as u32, |x, y| {
        let v = gray.value(y as usize, x as usize).clamp(0.0, 1.0);
        Luma([(v * 255.0).round() as u8])
    }))
}

pub fn save<P: AsRef<Path>>(path: P, image: &Image) -> RecogResult<()> {
    to_gray8(image)?.save(path.as_ref())?;
    Ok(())
}

fn to_rgb(image: &Image) -> RecogResult<RgbImage> {
    let gray = to_gray8(image)?;
    Ok(RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    }))
}

fn draw_point(canvas: &mut RgbImage, point: &Point, offset_x: f32, color: Rgb<u8>) {
    let (x, y) = point.position();
    let radius = (3.0 * point.sigma()).max(3.0);
    draw_hollow_circle_mut(
        canvas,
        ((x + offset_x) as i32, y as i32),
        radius as i32,
        color,
    );
    if point.angle != 0.0 {
        let (sin, cos) = point.angle.sin_cos();
        draw_line_segment_mut(
            canvas,
            (x + offset_x, y),
            (x + offset_x + radius * cos, y + radius * sin),
            color,
        );
    }
}

/// Circle every point, sized by its detection scale, with a tick along its
/// orientation when it has one.
pub fn render_keypoints(image: &Image, points: &[Point]) -> RecogResult<RgbImage> {
    let mut canvas = to_rgb(image)?;
    for point in points {
        draw_point(&mut canvas, point, 0.0, KEYPOINT_COLOR);
    }
    Ok(canvas)
}

/// Object and scene side by side with a line per match. A found hypothesis
/// adds the object's bounding box mapped into the scene.
pub fn render_matches(
    object: &Image,
    scene: &Image,
    matches: &[Match],
    hypothesis: &Hypothesis,
) -> RecogResult<RgbImage> {
    let object_rgb = to_rgb(object)?;
    let scene_rgb = to_rgb(scene)?;
    let offset = object_rgb.width();
    let mut canvas = RgbImage::new(
        offset + scene_rgb.width(),
        object_rgb.height().max(scene_rgb.height()),
    );
    image::imageops::overlay(&mut canvas, &object_rgb, 0, 0);
    image::imageops::overlay(&mut canvas, &scene_rgb, offset as i64, 0);

    let offset = offset as f32;
    for m in matches {
        draw_point(&mut canvas, &m.query_point, 0.0, KEYPOINT_COLOR);
        draw_point(&mut canvas, &m.train_point, offset, KEYPOINT_COLOR);
        let (qx, qy) = m.query_point.position();
        let (tx, ty) = m.train_point.position();
        draw_line_segment_mut(&mut canvas, (qx, qy), (tx + offset, ty), MATCH_COLOR);
    }

    if let Some(transform) = hypothesis.transform.filter(|_| hypothesis.is_found()) {
        let (w, h) = (object.width() as f32, object.height() as f32);
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|c| transform.apply(c));
        for i in 0..corners.len() {
            let (ax, ay) = corners[i];
            let (bx, by) = corners[(i + 1) % corners.len()];
            draw_line_segment_mut(&mut canvas, (ax + offset, ay), (bx + offset, by), OUTLINE_COLOR);
        }
    }
    Ok(canvas)
}

/// File stem of `path`, or `"image"` when it has none.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Base name for the outputs of the `index`-th scene. The index keeps scenes
/// with equal file stems in different directories apart.
pub fn output_name(index: usize, path: &Path) -> String {
    format!("{:03}_{}", index, stem(path))
}

/// A verified detection of an object in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub object: String,
    pub scene: String,
    pub probability: f32,
    pub transform: Transform2d,
}

impl HypothesisRecord {
    /// Fails with [`RecogError::NotFound`] when `hypothesis` was not accepted.
    pub fn new(object: impl Into<String>, scene: impl Into<String>, hypothesis: &Hypothesis) -> RecogResult<Self> {
        let scene = scene.into();
        match hypothesis.transform {
            Some(transform) if hypothesis.is_found() => Ok(Self {
                object: object.into(),
                scene,
                probability: hypothesis.probability,
                transform,
            }),
            _ => Err(RecogError::NotFound(scene)),
        }
    }

    /// Write as JSON or TOML depending on the extension of `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RecogResult<()> {
        let path = path.as_ref();
        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => return Err(RecogError::UnsupportedFormat(path.to_path_buf())),
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> RecogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match extension(path).as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(RecogError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn found() -> Hypothesis {
        Hypothesis {
            transform: Some(Transform2d::new(1.0, 0.0, 20.0, 5.0).with_votes(12)),
            probability: 0.9,
            inliers: 9,
        }
    }

    #[test]
    fn test_image_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.png");
        let image = Image::from_fn(6, 10, |r, c| ((r * 10 + c) * 4) as f32 / 255.0).unwrap();
        save(&path, &image).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.shape(), (6, 10, 1));
        for (a, b) in image.as_slice().iter().zip(loaded.as_slice()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_to_gray8_clamps() {
        let image = Image::from_vec(1, 3, 1, vec![-0.5, 0.5, 2.0]).unwrap();
        let gray = to_gray8(&image).unwrap();
        assert_eq!(gray.as_raw(), &vec![0u8, 128, 255]);
    }

    #[test]
    fn test_render_keypoints_marks_pixels() {
        let image = Image::new(32, 32, 1).unwrap();
        let canvas = render_keypoints(&image, &[Point::new(16, 16, 1.0)]).unwrap();
        assert_eq!(canvas.dimensions(), (32, 32));
        assert!(canvas.pixels().any(|p| *p == KEYPOINT_COLOR));
    }

    #[test]
    fn test_render_matches_canvas() {
        let object = Image::new(20, 10, 1).unwrap();
        let scene = Image::new(30, 40, 1).unwrap();
        let m = Match {
            query: 0,
            train: 0,
            distance: 0.0,
            query_point: Point::new(5, 5, 1.0),
            train_point: Point::new(25, 25, 1.0),
        };
        let canvas = render_matches(&object, &scene, &[m], &found()).unwrap();
        assert_eq!(canvas.dimensions(), (50, 30));
        assert!(canvas.pixels().any(|p| *p == MATCH_COLOR));
        assert!(canvas.pixels().any(|p| *p == OUTLINE_COLOR));
    }

    #[test]
    fn test_output_names_are_unique_per_scene() {
        let a = output_name(0, Path::new("day/scene.png"));
        let b = output_name(1, Path::new("night/scene.png"));
        assert_eq!(a, "000_scene");
        assert_eq!(b, "001_scene");
        assert_ne!(a, b);
        assert_eq!(stem(Path::new("/")), "image");
    }

    #[test]
    fn test_record_refuses_not_found() {
        assert!(matches!(
            HypothesisRecord::new("object.png", "scene.png", &Hypothesis::not_found()),
            Err(RecogError::NotFound(scene)) if scene == "scene.png"
        ));
    }

    #[test]
    fn test_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let record = HypothesisRecord::new("object.png", "scene.png", &found()).unwrap();
        for name in ["hit.json", "hit.toml"] {
            let path = dir.path().join(name);
            record.save(&path).unwrap();
            assert_eq!(HypothesisRecord::load(&path).unwrap(), record);
        }
        assert!(matches!(
            record.save(dir.path().join("hit.txt")),
            Err(RecogError::UnsupportedFormat(_))
        ));
    }
}
