use chrono::Duration;
use quiz_core::model::{
    DifficultyTier, PerformanceLedger, QuestionBank, QuestionDraft, QuestionId, SessionStats,
};
use quiz_core::selection::SelectionWeights;
use quiz_core::time::fixed_now;
use storage::repository::{ProgressStore, SettingsRepository, Storage};
use storage::sqlite::SqliteRepository;

fn bank(size: u64) -> QuestionBank {
    QuestionBank::from_drafts((1..=size).map(|id| QuestionDraft {
        id: QuestionId::new(id),
        prompt: format!("Question {id}?"),
        correct_answer: format!("Answer {id}"),
        hint: String::new(),
        explanation: String::new(),
        options: vec![format!("Answer {id}"), "Other".to_string()],
    }))
    .unwrap()
}

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_persists_ledger_and_stats() {
    let repo = repo("memdb_roundtrip").await;
    let bank = bank(4);
    let mut ledger = PerformanceLedger::new();
    let mut stats = SessionStats::new();

    for (id, correct) in [(1, false), (1, false), (2, true), (2, true), (2, true), (3, true)] {
        ledger
            .record_answer(&bank, QuestionId::new(id), correct, fixed_now())
            .unwrap();
        stats.record_outcome(correct);
    }
    repo.save(&ledger, &stats).await.expect("save");

    let loaded = repo.load().await.expect("load");
    assert_eq!(loaded.ledger, ledger);
    assert_eq!(loaded.stats, stats);
    assert_eq!(
        loaded.ledger.entry(QuestionId::new(1)).tier(),
        DifficultyTier::Hard
    );
    assert_eq!(
        loaded.ledger.entry(QuestionId::new(2)).tier(),
        DifficultyTier::Easy
    );
    assert_eq!(loaded.stats.best_streak(), 4);
}

#[tokio::test]
async fn sqlite_empty_database_loads_fresh_progress() {
    let repo = repo("memdb_empty").await;
    let loaded = repo.load().await.expect("load");
    assert!(loaded.ledger.is_empty());
    assert_eq!(loaded.stats, SessionStats::default());
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = repo("memdb_overwrite").await;
    let bank = bank(3);
    let mut ledger = PerformanceLedger::new();
    let mut stats = SessionStats::new();
    ledger
        .record_answer(&bank, QuestionId::new(1), true, fixed_now())
        .unwrap();
    stats.record_outcome(true);
    repo.save(&ledger, &stats).await.unwrap();

    let later = fixed_now() + Duration::days(2);
    ledger
        .record_answer(&bank, QuestionId::new(1), false, later)
        .unwrap();
    stats.record_outcome(false);
    repo.save(&ledger, &stats).await.unwrap();

    let loaded = repo.load().await.unwrap();
    let entry = loaded.ledger.entry(QuestionId::new(1));
    assert_eq!(entry.correct_count(), 1);
    assert_eq!(entry.incorrect_count(), 1);
    assert_eq!(entry.last_seen(), later);
    assert_eq!(loaded.stats.current_streak(), 0);
    assert_eq!(loaded.stats.best_streak(), 1);
}

#[tokio::test]
async fn sqlite_clear_forgets_everything() {
    let repo = repo("memdb_clear").await;
    let bank = bank(2);
    let mut ledger = PerformanceLedger::new();
    ledger
        .record_answer(&bank, QuestionId::new(2), false, fixed_now())
        .unwrap();
    let mut stats = SessionStats::new();
    stats.record_outcome(false);
    repo.save(&ledger, &stats).await.unwrap();

    repo.clear().await.expect("clear");
    let loaded = repo.load().await.unwrap();
    assert!(loaded.ledger.is_empty());
    assert_eq!(loaded.stats.total_answered(), 0);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn sqlite_weights_round_trip() {
    let repo = repo("memdb_weights").await;
    assert!(repo.get_weights().await.unwrap().is_none());

    let weights = SelectionWeights::new(10.0, 3.0, 2.0, 0.5, 0.2, 14).unwrap();
    repo.save_weights(&weights).await.unwrap();
    assert_eq!(repo.get_weights().await.unwrap(), Some(weights));

    repo.save_weights(&SelectionWeights::default()).await.unwrap();
    assert_eq!(
        repo.get_weights().await.unwrap(),
        Some(SelectionWeights::default())
    );
}

#[tokio::test]
async fn storage_sqlite_wires_both_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .settings
        .save_weights(&SelectionWeights::default())
        .await
        .unwrap();
    let loaded = storage.progress.load().await.unwrap();
    assert!(loaded.ledger.is_empty());
}
