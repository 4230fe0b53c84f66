//! Environment controller seam and single-model scene ownership.
//!
//! The sensing scene is one shared mutable resource. [`Scene`] is the
//! "environment ready" handle: it can only be built by running the one-time
//! setup, and it brackets every model's captures between a spawn and a
//! delete so that at most one model is ever present.

use crate::errors::{CollectorError, CollectorResult};
use tracing::{debug, info, warn};

/// Spawns and removes object models in the sensing scene.
pub trait EnvironmentController {
    /// One-time scene preparation, called before any model is spawned.
    fn initial_setup(&mut self) -> CollectorResult<()>;

    /// Places an instance of `model_name` in the scene.
    fn spawn(&mut self, model_name: &str) -> CollectorResult<()>;

    /// Removes whatever model is currently spawned.
    fn delete(&mut self) -> CollectorResult<()>;
}

impl<E: EnvironmentController + ?Sized> EnvironmentController for &mut E {
    fn initial_setup(&mut self) -> CollectorResult<()> {
        (**self).initial_setup()
    }

    fn spawn(&mut self, model_name: &str) -> CollectorResult<()> {
        (**self).spawn(model_name)
    }

    fn delete(&mut self) -> CollectorResult<()> {
        (**self).delete()
    }
}

impl<E: EnvironmentController + ?Sized> EnvironmentController for Box<E> {
    fn initial_setup(&mut self) -> CollectorResult<()> {
        (**self).initial_setup()
    }

    fn spawn(&mut self, model_name: &str) -> CollectorResult<()> {
        (**self).spawn(model_name)
    }

    fn delete(&mut self) -> CollectorResult<()> {
        (**self).delete()
    }
}

/// A prepared scene that owns its environment controller.
pub struct Scene<E: EnvironmentController> {
    env: E,
    occupant: Option<String>,
}

impl<E: EnvironmentController> Scene<E> {
    /// Runs the one-time setup and returns the ready handle.
    pub fn prepare(mut env: E) -> CollectorResult<Self> {
        env.initial_setup()?;
        info!("Scene prepared");
        Ok(Self {
            env,
            occupant: None,
        })
    }

    /// The model currently occupying the scene, if any.
    pub fn occupant(&self) -> Option<&str> {
        self.occupant.as_deref()
    }

    /// Spawns `model_name`, runs `work`, then deletes the model.
    ///
    /// Delete is attempted even when `work` fails; in that case the error
    /// from `work` is the one returned. If delete fails the scene stays
    /// marked as occupied, and later calls are refused.
    pub fn occupy<T, F>(&mut self, model_name: &str, work: F) -> CollectorResult<T>
    where
        F: FnOnce() -> CollectorResult<T>,
    {
        if let Some(occupant) = &self.occupant {
            return Err(CollectorError::SceneBusy {
                occupant: occupant.clone(),
                requested: model_name.to_string(),
            });
        }

        self.env.spawn(model_name)?;
        self.occupant = Some(model_name.to_string());
        debug!(model = model_name, "Model spawned");

        let result = work();

        match self.env.delete() {
            Ok(()) => {
                self.occupant = None;
                debug!(model = model_name, "Model deleted");
                result
            }
            Err(delete_err) => match result {
                Err(work_err) => {
                    warn!(model = model_name, error = %delete_err, "Delete failed after capture error");
                    Err(work_err)
                }
                Ok(_) => Err(delete_err),
            },
        }
    }

    /// Releases the environment controller.
    pub fn into_inner(self) -> E {
        self.env
    }
}
