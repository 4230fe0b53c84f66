//! In-process synthetic scene.
//!
//! Lets a run go end to end without a simulator. The environment, camera
//! and normal estimator are separate handles onto one scene state; the whole
//! run is single-threaded so the state lives in an `Rc<RefCell<_>>`.

use crate::capture::CaptureAdapter;
use crate::environment::EnvironmentController;
use crate::errors::{CollectorError, CollectorResult};
use crate::features::NormalEstimator;
use crate::point_cloud::{Point, PointCloud};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::f32::consts::PI;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
    Sphere,
    Cube,
    Cylinder,
}

impl Primitive {
    fn for_model(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("sphere") || lower.contains("ball") {
            Primitive::Sphere
        } else if lower.contains("cube") || lower.contains("box") {
            Primitive::Cube
        } else {
            match name_hash(name) % 3 {
                0 => Primitive::Sphere,
                1 => Primitive::Cube,
                _ => Primitive::Cylinder,
            }
        }
    }
}

fn name_hash(name: &str) -> u32 {
    // FNV-1a
    name.bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

fn base_color(name: &str) -> [u8; 3] {
    let h = name_hash(name);
    [(h >> 16) as u8, (h >> 8) as u8, h as u8]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSettings {
    pub points_per_cloud: usize,
    /// Probability that a capture returns an empty cloud.
    pub dropout: f64,
    pub seed: Option<u64>,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            points_per_cloud: 512,
            dropout: 0.0,
            seed: None,
        }
    }
}

struct SceneState {
    ready: bool,
    spawned: Option<String>,
    rng: StdRng,
    settings: SyntheticSettings,
}

impl SceneState {
    fn sample_cloud(&mut self) -> PointCloud {
        let Some(model) = self.spawned.clone() else {
            return PointCloud::empty();
        };
        if self.rng.random_bool(self.settings.dropout) {
            return PointCloud::empty();
        }

        let primitive = Primitive::for_model(&model);
        let color = base_color(&model);
        (0..self.settings.points_per_cloud)
            .map(|_| {
                let [x, y, z] = self.surface_point(primitive);
                let rgb = color.map(|c| c.saturating_add(self.rng.random_range(0..16)));
                Point::new(x, y, z, rgb)
            })
            .collect()
    }

    fn surface_point(&mut self, primitive: Primitive) -> [f32; 3] {
        match primitive {
            Primitive::Sphere => {
                let z: f32 = self.rng.random_range(-1.0..=1.0);
                let theta: f32 = self.rng.random_range(0.0..2.0 * PI);
                let r = (1.0 - z * z).sqrt();
                [0.1 * r * theta.cos(), 0.1 * r * theta.sin(), 0.1 * z]
            }
            Primitive::Cube => {
                let face = self.rng.random_range(0..6usize);
                let u: f32 = self.rng.random_range(-0.1..=0.1);
                let v: f32 = self.rng.random_range(-0.1..=0.1);
                let s = if face % 2 == 0 { 0.1 } else { -0.1 };
                match face / 2 {
                    0 => [s, u, v],
                    1 => [u, s, v],
                    _ => [u, v, s],
                }
            }
            Primitive::Cylinder => {
                let theta: f32 = self.rng.random_range(0.0..2.0 * PI);
                let z: f32 = self.rng.random_range(-0.15..=0.15);
                [0.05 * theta.cos(), 0.05 * theta.sin(), z]
            }
        }
    }
}

/// Shared synthetic scene; hand out its parts with [`SyntheticScene::split`].
#[derive(Clone)]
pub struct SyntheticScene {
    state: Rc<RefCell<SceneState>>,
}

impl SyntheticScene {
    /// A dropout outside `[0, 1]` is clamped into it; NaN counts as zero.
    pub fn new(mut settings: SyntheticSettings) -> Self {
        settings.dropout = if settings.dropout.is_nan() {
            0.0
        } else {
            settings.dropout.clamp(0.0, 1.0)
        };
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            state: Rc::new(RefCell::new(SceneState {
                ready: false,
                spawned: None,
                rng,
                settings,
            })),
        }
    }

    pub fn split(&self) -> (SyntheticEnvironment, SyntheticCamera, SyntheticNormals) {
        (
            SyntheticEnvironment {
                state: Rc::clone(&self.state),
            },
            SyntheticCamera {
                state: Rc::clone(&self.state),
            },
            SyntheticNormals,
        )
    }

    /// Name of the model currently in the scene.
    pub fn spawned(&self) -> Option<String> {
        self.state.borrow().spawned.clone()
    }
}

pub struct SyntheticEnvironment {
    state: Rc<RefCell<SceneState>>,
}

impl EnvironmentController for SyntheticEnvironment {
    fn initial_setup(&mut self) -> CollectorResult<()> {
        self.state.borrow_mut().ready = true;
        Ok(())
    }

    fn spawn(&mut self, model_name: &str) -> CollectorResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.ready {
            return Err(CollectorError::environment("spawn", "scene not set up"));
        }
        if let Some(current) = &state.spawned {
            return Err(CollectorError::environment(
                "spawn",
                format!("'{current}' is still in the scene"),
            ));
        }
        state.spawned = Some(model_name.to_string());
        Ok(())
    }

    fn delete(&mut self) -> CollectorResult<()> {
        self.state.borrow_mut().spawned = None;
        Ok(())
    }
}

pub struct SyntheticCamera {
    state: Rc<RefCell<SceneState>>,
}

impl CaptureAdapter for SyntheticCamera {
    fn capture_sample(&mut self) -> CollectorResult<Option<PointCloud>> {
        Ok(Some(self.state.borrow_mut().sample_cloud()))
    }
}

/// Estimates each normal as the unit direction from the cloud centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticNormals;

impl NormalEstimator for SyntheticNormals {
    fn get_normals(&mut self, cloud: &PointCloud) -> CollectorResult<Vec<[f32; 3]>> {
        let Some([cx, cy, cz]) = cloud.centroid() else {
            return Ok(Vec::new());
        };
        Ok(cloud
            .points
            .iter()
            .map(|p| {
                let d = [p.x - cx, p.y - cy, p.z - cz];
                let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                if norm > f32::EPSILON {
                    [d[0] / norm, d[1] / norm, d[2] / norm]
                } else {
                    [0.0, 0.0, 1.0]
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_sees_nothing_until_spawn() {
        let scene = SyntheticScene::new(SyntheticSettings {
            seed: Some(7),
            ..Default::default()
        });
        let (mut env, mut camera, _) = scene.split();
        env.initial_setup().unwrap();

        assert!(!camera.capture_sample().unwrap().unwrap().is_valid());
        env.spawn("cube").unwrap();
        assert_eq!(camera.capture_sample().unwrap().unwrap().len(), 512);
        env.delete().unwrap();
        assert!(scene.spawned().is_none());
    }

    #[test]
    fn spawn_requires_setup_and_empty_scene() {
        let scene = SyntheticScene::new(SyntheticSettings::default());
        let (mut env, _, _) = scene.split();
        assert!(env.spawn("cube").is_err());
        env.initial_setup().unwrap();
        env.spawn("cube").unwrap();
        assert!(env.spawn("sphere").is_err());
    }

    #[test]
    fn full_dropout_yields_empty_clouds() {
        let scene = SyntheticScene::new(SyntheticSettings {
            dropout: 1.0,
            seed: Some(1),
            ..Default::default()
        });
        let (mut env, mut camera, _) = scene.split();
        env.initial_setup().unwrap();
        env.spawn("sphere").unwrap();
        for _ in 0..5 {
            assert!(camera.capture_sample().unwrap().unwrap().is_empty());
        }
    }

    fn spawned_camera(dropout: f64) -> SyntheticCamera {
        let scene = SyntheticScene::new(SyntheticSettings {
            dropout,
            seed: Some(3),
            ..Default::default()
        });
        let (mut env, camera, _) = scene.split();
        env.initial_setup().unwrap();
        env.spawn("cube").unwrap();
        camera
    }

    #[test]
    fn dropout_above_one_behaves_as_full_dropout() {
        let mut camera = spawned_camera(2.0);
        for _ in 0..5 {
            assert!(camera.capture_sample().unwrap().unwrap().is_empty());
        }
    }

    #[test]
    fn negative_or_nan_dropout_never_drops() {
        for dropout in [-0.5, f64::NAN, f64::NEG_INFINITY] {
            let mut camera = spawned_camera(dropout);
            for _ in 0..5 {
                assert_eq!(camera.capture_sample().unwrap().unwrap().len(), 512);
            }
        }
    }
}
