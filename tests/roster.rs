//! Scenario tests for the cached roster, backed by an in-memory store.

use std::sync::Arc;

use bookbag::feed::change_channel;
use bookbag::store::{EntityStore, MemoryStore};
use bookbag::{Course, MaterialCategory, MaterialFile, NewCourse, NewStudyMaterial, Roster, StudyMaterial};

fn new_course(name: &str, code: &str) -> NewCourse {
    NewCourse {
        name: name.to_string(),
        code: code.to_string(),
        teacher: "Dr. Doe".to_string(),
        class_times: bookbag::parse_class_times("Monday at 10:00 in B201"),
        telegram_group: None,
        blc_link: None,
        blc_enroll_key: None,
    }
}

fn new_material(title: &str, course_id: &str) -> NewStudyMaterial {
    NewStudyMaterial {
        title: title.to_string(),
        description: "Reading for next week".to_string(),
        course_id: course_id.to_string(),
        category: MaterialCategory::Documents,
        files: vec![MaterialFile {
            url: "https://cdn.example.org/files/reading.pdf".to_string(),
            original_file_name: Some("Reading.pdf".to_string()),
        }],
    }
}


#[tokio::test]
async fn roster_reflects_the_store_after_refresh() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(MemoryStore::new());
    let algorithms: Course = store.create(&new_course("Algorithms", "CS201")).await.unwrap();
    let _: StudyMaterial = store.create(&new_material("Week 1 reading", algorithms.id())).await.unwrap();
    let _: StudyMaterial = store.create(&new_material("Week 2 reading", algorithms.id())).await.unwrap();

    let mut roster = Roster::new(Arc::clone(&store));
    assert!(roster.courses().is_empty());

    roster.refresh_all().await.unwrap();
    assert_eq!(roster.courses().len(), 1);
    assert_eq!(roster.courses()[0].name(), "Algorithms");
    assert_eq!(roster.materials().len(), 2);
    assert_eq!(roster.material_count_for(algorithms.id()), 2);
    assert_eq!(roster.material_count_for("some-other-course"), 0);
}

#[tokio::test]
async fn mutations_through_the_roster_keep_the_cache_fresh() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut roster = Roster::new(MemoryStore::new());

    let created = roster.create_course(&new_course("Databases", "CS305")).await.unwrap();
    assert_eq!(roster.courses().len(), 1);

    let mut renamed = new_course("Advanced Databases", "CS405");
    renamed.teacher = "Dr. Roe".to_string();
    roster.update_course(created.id(), &renamed).await.unwrap();
    assert_eq!(roster.courses()[0].name(), "Advanced Databases");
    assert_eq!(roster.courses()[0].teacher(), "Dr. Roe");

    let material = roster.create_material(&new_material("Syllabus", created.id())).await.unwrap();
    assert_eq!(roster.material_count_for(created.id()), 1);

    roster.delete_material(material.id()).await.unwrap();
    assert_eq!(roster.materials().len(), 0);

    roster.delete_course(created.id()).await.unwrap();
    assert!(roster.courses().is_empty());
}

#[tokio::test]
async fn external_changes_arrive_through_the_feed() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(MemoryStore::new());
    let (sender, mut receiver) = change_channel();
    store.attach_feed(sender);

    let mut roster = Roster::new(Arc::clone(&store));
    roster.refresh_all().await.unwrap();
    assert!(roster.courses().is_empty());

    // Someone else (another client, in production) creates data behind our back
    let course: Course = store.create(&new_course("Networks", "CS441")).await.unwrap();
    let _: StudyMaterial = store.create(&new_material("RFC reading list", course.id())).await.unwrap();

    roster.apply_pending(&mut receiver).await.unwrap();
    assert_eq!(roster.courses().len(), 1);
    assert_eq!(roster.material_count_for(course.id()), 1);

    // No pending events: applying is a no-op
    roster.apply_pending(&mut receiver).await.unwrap();
    assert_eq!(roster.courses().len(), 1);
}

#[tokio::test]
async fn class_times_survive_the_store_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut roster = Roster::new(MemoryStore::new());
    let created = roster.create_course(&new_course("Compilers", "CS352")).await.unwrap();

    let times = created.class_times();
    assert_eq!(times.len(), 1);
    assert_eq!(times[0].day, "Monday");
    assert_eq!(times[0].time, "10:00");
    assert_eq!(times[0].classroom.as_deref(), Some("B201"));
}

#[tokio::test]
async fn materials_for_course_filters_the_cache() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut roster = Roster::new(MemoryStore::new());
    let first = roster.create_course(&new_course("Algorithms", "CS201")).await.unwrap();
    let second = roster.create_course(&new_course("Databases", "CS305")).await.unwrap();

    roster.create_material(&new_material("Week 1", first.id())).await.unwrap();
    roster.create_material(&new_material("Week 2", first.id())).await.unwrap();
    roster.create_material(&new_material("Syllabus", second.id())).await.unwrap();

    let for_first: Vec<&StudyMaterial> = roster.materials_for_course(first.id());
    assert_eq!(for_first.len(), 2);
    assert!(for_first.iter().all(|material| material.course_id() == first.id()));
}

#[cfg(feature = "local_store_mocks_remote_store")]
mod mocked_failures {
    use super::*;
    use std::sync::Mutex;
    use bookbag::mock_behaviour::MockBehaviour;

    #[tokio::test]
    async fn a_failing_store_leaves_the_cache_untouched() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mock = Arc::new(Mutex::new(MockBehaviour::new()));
        let mut store = MemoryStore::new();
        store.set_mock_behaviour(Some(Arc::clone(&mock)));
        let store = Arc::new(store);

        let _: Course = store.create(&new_course("Algorithms", "CS201")).await.unwrap();

        let mut roster = Roster::new(Arc::clone(&store));
        roster.refresh_all().await.unwrap();
        assert_eq!(roster.courses().len(), 1);

        // The next two list calls fail: the cached snapshot must survive
        mock.lock().unwrap().list_behaviour = (0, 2);
        assert!(roster.refresh_all().await.is_err());
        assert_eq!(roster.courses().len(), 1);

        // Failures are exhausted, refreshing works again
        assert!(roster.refresh_all().await.is_err());
        roster.refresh_all().await.unwrap();
        assert_eq!(roster.courses().len(), 1);
    }

    #[tokio::test]
    async fn a_failing_create_reports_the_error() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mock = Arc::new(Mutex::new(MockBehaviour::fail_now(1)));
        let mut store = MemoryStore::new();
        store.set_mock_behaviour(Some(Arc::clone(&mock)));

        let mut roster = Roster::new(store);
        assert!(roster.create_course(&new_course("Algorithms", "CS201")).await.is_err());

        // Suspending the mock lets everything through again
        mock.lock().unwrap().suspend();
        roster.create_course(&new_course("Algorithms", "CS201")).await.unwrap();
        assert_eq!(roster.courses().len(), 1);
    }
}
