use chrono::Duration;
use listen_core::model::{
    NewQuestion, QuestionKind, ScoringRules, SessionRecord, StarRating, Tier,
};
use listen_core::time::fixed_now;
use storage::import::import_seed;
use storage::repository::{
    ContentRepository, ProgressionRepository, SessionResultRepository, Storage,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(text: &str, kind: QuestionKind, tier: Tier) -> NewQuestion {
    NewQuestion {
        display_text: text.into(),
        meaning: Some("meaning".into()),
        kind,
        tier,
    }
}

#[tokio::test]
async fn sqlite_questions_round_trip_with_tokens() {
    let repo = connect("memdb_questions").await;

    let saved = repo
        .insert_questions(&[
            draft("Maayong buntag", QuestionKind::Listening, Tier::Beginner),
            draft("Asa ang banyo", QuestionKind::Ordering, Tier::Beginner),
            draft("Bisan unsa", QuestionKind::Translation, Tier::Advanced),
        ])
        .await
        .unwrap();
    assert_eq!(saved.len(), 3);

    let beginner = repo.get_questions(Tier::Beginner).await.unwrap();
    assert_eq!(beginner.len(), 2);
    assert_eq!(beginner[0].answer_tokens(), ["Maayong", "buntag"]);
    assert_eq!(beginner[1].kind(), QuestionKind::Ordering);
    assert_eq!(beginner[0].meaning(), Some("meaning"));
    assert_eq!(repo.count_questions().await.unwrap(), 3);
}

#[tokio::test]
async fn sqlite_distinct_questions_drop_duplicate_content() {
    let repo = connect("memdb_distinct").await;

    repo.insert_questions(&[
        draft("Salamat kaayo", QuestionKind::Listening, Tier::Beginner),
        draft("salamat  KAAYO", QuestionKind::Ordering, Tier::Beginner),
        draft("Oo", QuestionKind::Listening, Tier::Beginner),
    ])
    .await
    .unwrap();

    let distinct = repo.get_distinct_questions(Tier::Beginner).await.unwrap();
    assert_eq!(distinct.len(), 2);
    assert_eq!(distinct[0].display_text(), "Salamat kaayo");
    assert_eq!(distinct[1].display_text(), "Oo");
}

#[tokio::test]
async fn sqlite_progression_tracks_unlocks_stars_and_experience() {
    let repo = connect("memdb_progression").await;

    let initial = repo.list_progress().await.unwrap();
    assert!(initial[0].unlocked);
    assert!(!initial[1].unlocked);

    repo.unlock_tier(Tier::Intermediate).await.unwrap();
    assert!(repo.get_progress(Tier::Intermediate).await.unwrap().unlocked);

    assert!(repo.record_best_stars(Tier::Beginner, StarRating::new(2)).await.unwrap());
    assert!(!repo.record_best_stars(Tier::Beginner, StarRating::new(2)).await.unwrap());
    assert!(repo.record_best_stars(Tier::Beginner, StarRating::new(3)).await.unwrap());
    assert_eq!(
        repo.get_progress(Tier::Beginner).await.unwrap().best_stars,
        StarRating::MAX
    );

    assert_eq!(repo.total_experience().await.unwrap(), 0);
    repo.add_experience(80).await.unwrap();
    assert_eq!(repo.add_experience(150).await.unwrap(), 230);
    assert_eq!(repo.total_experience().await.unwrap(), 230);
}

#[tokio::test]
async fn sqlite_session_history_lists_newest_first() {
    let repo = connect("memdb_history").await;
    let rules = ScoringRules::default();
    let now = fixed_now();

    for (i, correct) in [6_u32, 8, 10].into_iter().enumerate() {
        let offset = i64::try_from(i).unwrap();
        let started = now + Duration::minutes(offset * 10);
        let record = SessionRecord::new(
            Tier::Beginner,
            started,
            started + Duration::minutes(4),
            rules.score(correct, 10).unwrap(),
        )
        .unwrap();
        repo.append_record(&record).await.unwrap();
    }

    let history = repo.list_records(Tier::Beginner, 2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].result().correct_count, 10);
    assert_eq!(history[0].result().xp_earned, 150);
    assert!(history[1].result().passed);
    assert!(repo.list_records(Tier::Advanced, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_storage_imports_bundled_seed_once() {
    let storage = Storage::sqlite("sqlite:file:memdb_seed?mode=memory&cache=shared")
        .await
        .expect("storage");

    let first = import_seed(&storage, None, false).await.unwrap();
    let second = import_seed(&storage, None, false).await.unwrap();

    assert!(first.inserted > 0);
    assert!(second.skipped);
    for tier in Tier::ALL {
        assert!(!storage.content.get_questions(tier).await.unwrap().is_empty());
    }
}
