use std::fs;
use std::time::Duration;

use anyhow::Result;
use btup_app::Controller;
use btup_config::SeederConfig;
use btup_runtime::StatsStore;
use btup_test_support::fixtures::CatalogFixture;
use btup_torrent_core::{
    EngineAlert, RECOUNT_DOWNLOAD_LIMIT_BPS, SeedEngine, Session, SessionToken, TorrentRecord,
    TorrentSnapshot,
};
use btup_torrent_sim::{EngineCommand, SimulatedEngine, SwarmProfile};

const NOW: u64 = 1_700_000_000;

struct Setup {
    threshold: u32,
    capacity_bytes: u64,
    max_parallel_recounts: usize,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            threshold: 3,
            capacity_bytes: 1_000,
            max_parallel_recounts: 100,
        }
    }
}

fn controller(
    fixture: &CatalogFixture,
    setup: Setup,
    engine: SimulatedEngine,
) -> Controller<SimulatedEngine> {
    let config = SeederConfig {
        update_delay: Duration::from_secs(10),
        min_seeders_to_ignore: setup.threshold,
        min_recount_age_secs: 100,
        max_parallel_recounts: setup.max_parallel_recounts,
        recount_timeout_secs: 30,
        torrents_dir: fixture.torrents_dir(),
        data_dir: fixture.data_dir(),
        scratch_dir: fixture.scratch_dir(),
        capacity_bytes: setup.capacity_bytes,
        stats_file: fixture.stats_path(),
    };
    Controller::new(config, StatsStore::new(fixture.stats_path()), engine)
}

fn track(
    fixture: &CatalogFixture,
    controller: &mut Controller<SimulatedEngine>,
    name: &str,
    size: u64,
    seeders: u32,
) -> Result<()> {
    fixture.add_definition(name, size)?;
    controller
        .stats_mut()
        .insert(name, TorrentRecord::measured(NOW, seeders));
    Ok(())
}

fn added_names(commands: &[EngineCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|command| match command {
            EngineCommand::Add { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn token_of<'a>(
    mut sessions: impl Iterator<Item = &'a Session>,
    name: &str,
) -> Option<SessionToken> {
    sessions
        .find(|session| session.name == name)
        .map(|session| session.token)
}

#[tokio::test]
async fn seeds_scarcest_items_below_threshold() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "a", 10, 1)?;
    track(&fixture, &mut controller, "b", 10, 2)?;
    track(&fixture, &mut controller, "c", 10, 5)?;
    track(&fixture, &mut controller, "d", 10, 8)?;

    let report = controller.update(NOW).await?;

    assert_eq!(report.started, vec!["a".to_string(), "b".to_string()]);
    assert!(controller.is_seeding("a"));
    assert!(controller.is_seeding("b"));
    assert!(!controller.is_seeding("c"));
    let commands = controller.engine_mut().take_commands();
    assert_eq!(added_names(&commands), vec!["a".to_string(), "b".to_string()]);
    assert!(commands.iter().all(|command| matches!(
        command,
        EngineCommand::Add {
            download_limit_bps: None,
            ..
        }
    )));
    assert_eq!(report.occupied_bytes, 20);
    Ok(())
}

#[tokio::test]
async fn second_pass_without_changes_issues_no_commands() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "a", 10, 0)?;
    fixture.add_payload("a")?;

    controller.update(NOW).await?;
    controller.reconcile_alerts(NOW).await;
    assert_eq!(controller.engine_mut().take_commands().len(), 1);

    let report = controller.update(NOW + 20).await?;
    assert!(report.started.is_empty());
    assert!(report.stopped.is_empty());
    assert!(controller.engine().commands().is_empty());
    Ok(())
}

#[tokio::test]
async fn running_seeder_tolerates_one_extra_seeder() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "a", 10, 2)?;
    fixture.add_payload("a")?;

    controller.update(NOW).await?;
    assert!(controller.is_seeding("a"));

    controller.stats_mut().record_measurement("a", NOW + 1, 3);
    let report = controller.update(NOW + 20).await?;
    assert!(report.stopped.is_empty());
    assert!(controller.is_seeding("a"));

    controller.stats_mut().record_measurement("a", NOW + 2, 4);
    let report = controller.update(NOW + 40).await?;
    assert_eq!(report.stopped, vec!["a".to_string()]);
    assert!(!controller.is_seeding("a"));

    controller.stats_mut().record_measurement("a", NOW + 3, 3);
    let report = controller.update(NOW + 60).await?;
    assert!(report.started.is_empty());
    assert!(!controller.is_seeding("a"));
    Ok(())
}

#[tokio::test]
async fn evicts_more_abundant_data_to_admit_scarcer_item() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let setup = Setup {
        capacity_bytes: 100,
        ..Setup::default()
    };
    let mut controller = controller(&fixture, setup, SimulatedEngine::new());
    track(&fixture, &mut controller, "abundant", 50, 10)?;
    track(&fixture, &mut controller, "kept", 40, 1)?;
    track(&fixture, &mut controller, "scarce", 20, 0)?;
    let abundant_dir = fixture.add_payload("abundant")?;
    let kept_dir = fixture.add_payload("kept")?;

    let report = controller.update(NOW).await?;

    assert_eq!(report.evicted, vec!["abundant".to_string()]);
    assert_eq!(report.started, vec!["scarce".to_string(), "kept".to_string()]);
    assert!(!abundant_dir.exists());
    assert!(kept_dir.exists());
    assert_eq!(report.occupied_bytes, 60);
    assert!(controller.stats().contains("abundant"));
    Ok(())
}

#[tokio::test]
async fn infeasible_eviction_unregisters_candidate_and_keeps_data() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let setup = Setup {
        threshold: 5,
        capacity_bytes: 100,
        ..Setup::default()
    };
    let mut controller = controller(&fixture, setup, SimulatedEngine::new());
    track(&fixture, &mut controller, "held", 90, 1)?;
    track(&fixture, &mut controller, "candidate", 20, 2)?;
    let held_dir = fixture.add_payload("held")?;

    let report = controller.update(NOW).await?;

    assert_eq!(report.started, vec!["held".to_string()]);
    assert_eq!(report.unregistered, vec!["candidate".to_string()]);
    assert!(report.evicted.is_empty());
    assert!(held_dir.exists());
    assert!(!controller.stats().contains("candidate"));
    assert_eq!(added_names(controller.engine().commands()), vec!["held".to_string()]);
    Ok(())
}

#[tokio::test]
async fn occupancy_never_exceeds_capacity() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let setup = Setup {
        threshold: 10,
        capacity_bytes: 100,
        ..Setup::default()
    };
    let mut controller = controller(&fixture, setup, SimulatedEngine::new());
    for (name, seeders) in [("w", 0), ("x", 1), ("y", 2), ("z", 3)] {
        track(&fixture, &mut controller, name, 30, seeders)?;
    }

    let report = controller.update(NOW).await?;

    assert_eq!(report.started.len(), 3);
    assert_eq!(report.unregistered, vec!["z".to_string()]);
    assert_eq!(report.occupied_bytes, 90);
    assert!(report.occupied_bytes <= 100);
    Ok(())
}

#[tokio::test]
async fn removed_definition_stops_seeding_and_purges_data() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "gone", 10, 0)?;
    let data_dir = fixture.add_payload("gone")?;
    controller.update(NOW).await?;
    assert!(controller.is_seeding("gone"));
    controller.engine_mut().take_commands();

    fixture.remove_definition("gone")?;
    controller.update(NOW + 20).await?;

    assert!(!controller.is_seeding("gone"));
    assert!(!controller.stats().contains("gone"));
    assert!(!data_dir.exists());
    assert!(controller.engine().commands().iter().any(EngineCommand::is_remove));
    Ok(())
}

#[tokio::test]
async fn zero_seeders_without_local_copy_unregisters() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "lost", 10, 0)?;

    controller.update(NOW).await?;
    assert!(controller.is_seeding("lost"));
    controller.reconcile_alerts(NOW).await;

    assert!(!controller.is_seeding("lost"));
    assert!(!controller.stats().contains("lost"));
    assert_eq!(controller.engine().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn recount_uses_scratch_and_scrape_reply() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let engine = SimulatedEngine::new().with_swarm("item", SwarmProfile::answering(4, 9));
    let mut controller = controller(&fixture, Setup::default(), engine);
    fixture.add_definition("item", 10)?;
    controller
        .stats_mut()
        .insert("item", TorrentRecord::measured(NOW - 500, 1));

    let started = controller.start_recounts(NOW).await;
    assert_eq!(started, vec!["item".to_string()]);
    let scratch = fixture.add_scratch("item")?;
    match controller.engine().commands().first() {
        Some(EngineCommand::Add {
            save_path,
            download_limit_bps,
            ..
        }) => {
            assert_eq!(save_path, &scratch);
            assert_eq!(*download_limit_bps, Some(RECOUNT_DOWNLOAD_LIMIT_BPS));
        }
        other => anyhow::bail!("expected add command, got {other:?}"),
    }

    assert_eq!(controller.reconcile_alerts(NOW + 1).await, 1);
    assert_eq!(controller.reconcile_alerts(NOW + 2).await, 1);

    assert_eq!(
        controller.stats().get("item"),
        Some(&TorrentRecord::measured(NOW + 2, 4))
    );
    assert!(!controller.is_recounting("item"));
    assert!(!scratch.exists());
    assert_eq!(controller.engine().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn invalid_scrape_reply_leaves_recount_to_timeout() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let engine = SimulatedEngine::new().with_swarm("item", SwarmProfile::answering(-1, 9));
    let mut controller = controller(&fixture, Setup::default(), engine);
    fixture.add_definition("item", 10)?;
    controller
        .stats_mut()
        .insert("item", TorrentRecord::measured(NOW - 500, 1));

    controller.start_recounts(NOW).await;
    controller.reconcile_alerts(NOW).await;
    controller.reconcile_alerts(NOW).await;
    assert!(controller.is_recounting("item"));
    assert_eq!(
        controller.stats().get("item"),
        Some(&TorrentRecord::measured(NOW - 500, 1))
    );

    let finalized = controller.finalize_timed_out(NOW + 31).await;
    assert_eq!(finalized, vec!["item".to_string()]);
    assert_eq!(
        controller.stats().get("item"),
        Some(&TorrentRecord::measured(NOW + 31, 9))
    );
    Ok(())
}

#[tokio::test]
async fn silent_tracker_finalizes_once_after_timeout() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let engine = SimulatedEngine::new().with_swarm("item", SwarmProfile::silent(7));
    let mut controller = controller(&fixture, Setup::default(), engine);
    fixture.add_definition("item", 10)?;
    controller
        .stats_mut()
        .insert("item", TorrentRecord::measured(NOW - 500, 2));

    controller.start_recounts(NOW).await;
    controller.reconcile_alerts(NOW).await;

    assert!(controller.finalize_timed_out(NOW + 30).await.is_empty());
    assert_eq!(
        controller.finalize_timed_out(NOW + 31).await,
        vec!["item".to_string()]
    );
    assert!(controller.finalize_timed_out(NOW + 40).await.is_empty());
    assert_eq!(
        controller.stats().get("item"),
        Some(&TorrentRecord::measured(NOW + 31, 7))
    );
    let removes = controller
        .engine()
        .commands()
        .iter()
        .filter(|command| command.is_remove())
        .count();
    assert_eq!(removes, 1);
    Ok(())
}

#[tokio::test]
async fn timeout_without_engine_status_keeps_previous_count() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    fixture.add_definition("item", 10)?;
    controller
        .stats_mut()
        .insert("item", TorrentRecord::measured(NOW - 500, 5));

    controller.start_recounts(NOW).await;
    let token = token_of(controller.recounting(), "item")
        .ok_or_else(|| anyhow::anyhow!("recount session missing"))?;
    controller.engine_mut().remove_torrent(token).await?;

    controller.finalize_timed_out(NOW + 31).await;
    assert_eq!(
        controller.stats().get("item"),
        Some(&TorrentRecord::measured(NOW + 31, 5))
    );
    assert!(!controller.is_recounting("item"));
    Ok(())
}

#[tokio::test]
async fn recounts_respect_parallelism_cap_and_missing_definitions() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let setup = Setup {
        max_parallel_recounts: 2,
        ..Setup::default()
    };
    let mut controller = controller(&fixture, setup, SimulatedEngine::new());
    for name in ["a", "b", "c"] {
        fixture.add_definition(name, 10)?;
        controller
            .stats_mut()
            .insert(name, TorrentRecord::measured(NOW - 500, 1));
    }
    controller
        .stats_mut()
        .insert("orphan", TorrentRecord::measured(0, 1));
    controller
        .stats_mut()
        .insert("fresh", TorrentRecord::measured(NOW - 10, 1));
    fixture.add_definition("fresh", 10)?;

    let started = controller.start_recounts(NOW).await;
    assert_eq!(started, vec!["a".to_string(), "b".to_string()]);
    assert!(controller.start_recounts(NOW).await.is_empty());
    assert_eq!(controller.recounting().count(), 2);
    assert!(controller.stats().contains("orphan"));

    controller.finalize_timed_out(NOW + 31).await;
    let started = controller.start_recounts(NOW + 31).await;
    assert_eq!(started, vec!["c".to_string()]);
    assert!(!controller.stats().contains("orphan"));
    assert!(!controller.is_recounting("fresh"));
    Ok(())
}

#[tokio::test]
async fn stray_alerts_remove_unknown_participants() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut engine = SimulatedEngine::new();
    let stray = SessionToken::new();
    engine.inject_alert(EngineAlert::Unhandled {
        token: Some(stray),
        kind: "state_changed".to_string(),
    });
    engine.inject_alert(EngineAlert::AddConfirmed {
        token: None,
        status: TorrentSnapshot::default(),
    });
    let mut controller = controller(&fixture, Setup::default(), engine);

    assert_eq!(controller.reconcile_alerts(NOW).await, 2);
    assert_eq!(
        controller.engine().commands(),
        &[EngineCommand::Remove { token: stray }]
    );
    Ok(())
}

#[tokio::test]
async fn seeding_and_recounting_may_share_a_name() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    fixture.add_definition("both", 10)?;
    fixture.add_payload("both")?;
    controller
        .stats_mut()
        .insert("both", TorrentRecord::measured(NOW - 500, 1));

    controller.update(NOW).await?;
    controller.start_recounts(NOW).await;

    assert!(controller.is_seeding("both"));
    assert!(controller.is_recounting("both"));
    assert_eq!(controller.engine().active_count(), 2);
    Ok(())
}

#[tokio::test]
async fn shutdown_releases_everything() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "seeded", 10, 0)?;
    fixture.add_payload("seeded")?;
    fixture.add_definition("counted", 10)?;
    controller
        .stats_mut()
        .insert("counted", TorrentRecord::measured(NOW - 500, 6));

    controller.update(NOW).await?;
    controller.start_recounts(NOW).await;
    fixture.add_scratch("counted")?;
    assert_eq!(controller.engine().active_count(), 2);

    controller.shutdown(NOW + 5).await?;

    assert_eq!(controller.engine().active_count(), 0);
    assert_eq!(controller.seeding().count(), 0);
    assert_eq!(controller.recounting().count(), 0);
    assert!(!fixture.scratch_dir().exists());
    assert!(!controller.stats().is_dirty());
    let reloaded = StatsStore::load(fixture.stats_path())?;
    assert_eq!(reloaded.len(), 2);
    Ok(())
}

#[tokio::test]
async fn seeding_without_payload_still_occupies_the_budget() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let setup = Setup {
        capacity_bytes: 100,
        ..Setup::default()
    };
    let mut controller = controller(&fixture, setup, SimulatedEngine::new());
    track(&fixture, &mut controller, "a", 60, 1)?;

    let report = controller.update(NOW).await?;
    assert_eq!(report.started, vec!["a".to_string()]);

    track(&fixture, &mut controller, "b", 60, 2)?;
    let report = controller.update(NOW + 20).await?;

    assert!(report.started.is_empty());
    assert_eq!(report.unregistered, vec!["b".to_string()]);
    assert_eq!(report.occupied_bytes, 60);
    assert!(controller.is_seeding("a"));
    assert!(!controller.is_seeding("b"));
    Ok(())
}

#[tokio::test]
async fn recount_of_deleted_definition_stops_its_seeder() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "x", 10, 0)?;
    fixture.add_payload("x")?;
    controller.update(NOW).await?;
    assert!(controller.is_seeding("x"));

    fixture.remove_definition("x")?;
    let started = controller.start_recounts(NOW + 200).await;

    assert!(started.is_empty());
    assert!(!controller.is_seeding("x"));
    assert!(!controller.stats().contains("x"));
    assert_eq!(controller.engine().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn update_stops_seeders_without_a_record() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    track(&fixture, &mut controller, "x", 10, 0)?;
    controller.update(NOW).await?;
    assert!(controller.is_seeding("x"));

    fixture.remove_definition("x")?;
    controller.stats_mut().remove("x");
    controller.update(NOW + 20).await?;

    assert!(!controller.is_seeding("x"));
    assert_eq!(controller.engine().active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn unparsable_definition_data_counts_toward_occupancy() -> Result<()> {
    let fixture = CatalogFixture::new()?;
    let mut controller = controller(&fixture, Setup::default(), SimulatedEngine::new());
    fs::create_dir_all(fixture.torrents_dir())?;
    fs::write(fixture.torrents_dir().join("broken"), b"not bencode")?;
    fixture.add_payload("broken")?;
    track(&fixture, &mut controller, "a", 10, 1)?;

    let report = controller.update(NOW).await?;

    assert_eq!(report.started, vec!["a".to_string()]);
    assert_eq!(report.occupied_bytes, 17);
    assert!(fixture.data_dir().join("broken").is_dir());
    Ok(())
}
