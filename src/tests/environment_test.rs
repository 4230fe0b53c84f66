// src/tests/environment_test.rs
use crate::environment::Scene;
use crate::errors::CollectorError;
use crate::tests::test_utils::RecordingEnvironment;

#[test]
fn prepare_runs_setup_once() {
    let mut env = RecordingEnvironment::default();
    let mut scene = Scene::prepare(&mut env).unwrap();
    scene.occupy("cube", || Ok(())).unwrap();
    scene.occupy("sphere", || Ok(())).unwrap();
    drop(scene);

    assert_eq!(
        env.events,
        vec!["setup", "spawn:cube", "delete", "spawn:sphere", "delete"]
    );
}

#[test]
fn occupant_visible_only_inside_occupy() {
    let mut scene = Scene::prepare(RecordingEnvironment::default()).unwrap();
    assert!(scene.occupant().is_none());
    let value = scene.occupy("cube", || Ok(5)).unwrap();
    assert_eq!(value, 5);
    assert!(scene.occupant().is_none());
}

#[test]
fn work_failure_still_deletes() {
    let mut env = RecordingEnvironment::default();
    let mut scene = Scene::prepare(&mut env).unwrap();
    let result: Result<(), _> =
        scene.occupy("cube", || Err(CollectorError::capture("sensor offline")));
    assert!(matches!(result, Err(CollectorError::Capture { .. })));
    assert!(scene.occupant().is_none());
    drop(scene);

    assert_eq!(env.events, vec!["setup", "spawn:cube", "delete"]);
}

#[test]
fn failed_delete_blocks_next_model() {
    let env = RecordingEnvironment {
        fail_delete: true,
        ..Default::default()
    };
    let mut scene = Scene::prepare(env).unwrap();

    let first = scene.occupy("cube", || Ok(()));
    assert!(matches!(first, Err(CollectorError::Environment { .. })));
    assert_eq!(scene.occupant(), Some("cube"));

    let second = scene.occupy("sphere", || Ok(()));
    assert!(matches!(second, Err(CollectorError::SceneBusy { .. })));
}

#[test]
fn failed_spawn_skips_work_and_delete() {
    let env = RecordingEnvironment {
        fail_spawn_of: Some("cube".into()),
        ..Default::default()
    };
    let mut scene = Scene::prepare(env).unwrap();
    let mut ran = false;
    let result = scene.occupy("cube", || {
        ran = true;
        Ok(())
    });
    assert!(result.is_err());
    assert!(!ran);
    assert!(scene.occupant().is_none());
    assert_eq!(scene.into_inner().events, vec!["setup"]);
}
