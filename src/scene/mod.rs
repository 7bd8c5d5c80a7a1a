//! Wireframe drawing of one playback frame.

pub mod canvas;

use crate::aabb::{AABB, EDGES};
use crate::camera::{FreeFlyCamera, NEAR};
use crate::color::{Color, OutputColor};
use canvas::Canvas;
use ultraviolet::Vec3;

pub struct Marker {
    pub center: Vec3,
    pub color: OutputColor,
}

/// Everything needed to draw one frame, detached from the playback state.
pub struct FrameJob {
    pub index: usize,
    pub time: f64,
    pub camera: FreeFlyCamera,
    pub markers: Vec<Marker>,
}

pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    /// Marker edge length.
    pub cube_size: f32,
}

/// Cuts a camera space segment at the near plane, `None` if it is all behind it.
fn clip_near(a: Vec3, b: Vec3) -> Option<(Vec3, Vec3)> {
    match (a.z >= NEAR, b.z >= NEAR) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (a_in, _) => {
            let t = (NEAR - a.z) / (b.z - a.z);
            let cut = a + (b - a) * t;
            if a_in {
                Some((a, cut))
            } else {
                Some((cut, b))
            }
        }
    }
}

pub fn render(job: &FrameJob, settings: &RenderSettings) -> Canvas {
    let mut canvas = Canvas::new(
        settings.width,
        settings.height,
        OutputColor::from(Color::BACKGROUND),
    );
    let camera = &job.camera;

    for marker in job.markers.iter() {
        if camera.view(marker.center).z > camera.far() {
            continue;
        }

        let corners = AABB::cube(marker.center, settings.cube_size).corners();
        let view: Vec<Vec3> = corners.iter().map(|&c| camera.view(c)).collect();
        for &(i, j) in EDGES.iter() {
            if let Some((a, b)) = clip_near(view[i], view[j]) {
                canvas.line(
                    camera.project_view(a, settings.width, settings.height),
                    camera.project_view(b, settings.width, settings.height),
                    marker.color,
                );
            }
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: OutputColor = [255, 0, 0];

    fn job(camera: FreeFlyCamera, centers: &[Vec3]) -> FrameJob {
        FrameJob {
            index: 0,
            time: 0.,
            camera,
            markers: centers
                .iter()
                .map(|&center| Marker {
                    center,
                    color: RED,
                })
                .collect(),
        }
    }

    fn red_pixels(canvas: &Canvas) -> Vec<(usize, usize)> {
        let mut pixels = Vec::new();
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y) == Some(RED) {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }

    const SETTINGS: RenderSettings = RenderSettings {
        width: 64,
        height: 64,
        cube_size: 2.,
    };

    #[test]
    fn test_cube_in_front_is_drawn_centered() {
        let camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 60., 100.);
        let canvas = render(&job(camera, &[Vec3::new(0., 0., -10.)]), &SETTINGS);

        let pixels = red_pixels(&canvas);
        assert!(!pixels.is_empty());
        let (sx, sy) = pixels
            .iter()
            .fold((0, 0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (cx, cy) = (sx / pixels.len(), sy / pixels.len());
        assert!((30..=33).contains(&cx) && (30..=33).contains(&cy));
        // Nothing drawn near the corners of the image
        assert!(pixels.iter().all(|&(x, y)| x > 10 && x < 54 && y > 10 && y < 54));
    }

    #[test]
    fn test_cube_behind_or_too_far_is_skipped() {
        let camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 60., 100.);
        let canvas = render(
            &job(camera, &[Vec3::new(0., 0., 10.), Vec3::new(0., 0., -200.)]),
            &SETTINGS,
        );
        assert!(red_pixels(&canvas).is_empty());
    }

    #[test]
    fn test_cube_crossing_near_plane_is_clipped() {
        let camera = FreeFlyCamera::new(Vec3::zero(), 0., 0., 120., 100.);
        let canvas = render(&job(camera, &[Vec3::new(0., 0., -0.5)]), &SETTINGS);
        assert!(!red_pixels(&canvas).is_empty());
    }

    #[test]
    fn test_clip_near() {
        let a = Vec3::new(0., 0., -1.);
        let b = Vec3::new(0., 0., 1.);
        let (p, q) = clip_near(a, b).unwrap();
        assert!((p.z - NEAR).abs() < 1e-6);
        assert_eq!(q, b);
        assert_eq!(clip_near(a, a), None);
        assert_eq!(clip_near(b, b), Some((b, b)));
    }
}
