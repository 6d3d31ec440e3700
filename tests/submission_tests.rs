mod test_utils;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use property_portal::{
    db::memory::InMemoryAdminRepo,
    entities::{
        property::{Property, PropertyInsert, PropertyQuery, PropertyUpdate},
        submission::{PropertySubmission, SubmissionOutcome, SubmissionState},
        upload::ImageFile,
    },
    errors::AppError,
    imaging::compressor::ImageCompressor,
    repositories::property::PropertyRepository,
    storage::memory::InMemoryStorage,
    use_cases::{
        persistence::PersistenceWriter,
        submission::{PropertySubmissionHandler, SubmissionTracker},
        upload::ParallelUploader,
    },
};
use test_utils::*;
use uuid::Uuid;

mock! {
    pub PropertyRepo {}

    #[async_trait]
    impl PropertyRepository for PropertyRepo {
        async fn create_property(&self, insert: &PropertyInsert) -> Result<Uuid, AppError>;
        async fn update_property(&self, id: &Uuid, update: &PropertyUpdate) -> Result<Property, AppError>;
        async fn get_property_by_id(&self, id: &Uuid) -> Result<Option<Property>, AppError>;
        async fn query_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError>;
        async fn set_property_images(
            &self,
            id: &Uuid,
            images: &[String],
            updated_at: DateTime<Utc>,
        ) -> Result<Property, AppError>;
        async fn set_property_flags(
            &self,
            id: &Uuid,
            is_featured: Option<bool>,
            is_active: Option<bool>,
            updated_at: DateTime<Utc>,
        ) -> Result<Property, AppError>;
        async fn delete_property(&self, id: &Uuid) -> Result<(), AppError>;
        async fn check_connection(&self) -> Result<(), AppError>;
    }
}

fn saved(outcome: SubmissionOutcome) -> (Property, usize, usize, Option<String>) {
    match outcome {
        SubmissionOutcome::Saved { property, uploaded, failed, warning } => (property, uploaded, failed, warning),
        SubmissionOutcome::Failed { message } => panic!("Expected a saved property, got failure: {}", message),
    }
}

#[tokio::test]
async fn new_property_with_three_images_stores_all_urls() {
    let app = TestApp::spawn();
    let images = vec![
        png_image("front.png", 1600, 900),
        png_image("lobby.png", 640, 480),
        png_image("pool.png", 1200, 1200),
    ];

    let outcome = app
        .state
        .submission_handler
        .submit(PropertySubmission::create(sample_form(), images, app.admin.id))
        .await
        .unwrap();

    let (property, uploaded, failed, warning) = saved(outcome);
    assert_eq!(uploaded, 3);
    assert_eq!(failed, 0);
    assert!(warning.is_none());
    assert_eq!(property.details.images.len(), 3);
    assert!(property.updated_at >= property.created_at);
    assert_eq!(property.created_by, app.admin.id);
    assert!(property.details.images.iter().all(|url| app.storage.contains_url(url)));

    let stored = app.property_repo.get_property_by_id(&property.id).await.unwrap().unwrap();
    assert_eq!(stored.details.images, property.details.images);
    assert_eq!(stored.created_at, stored.updated_at);
}

#[tokio::test]
async fn uploaded_images_are_compressed_jpegs_under_the_collection() {
    let app = TestApp::spawn();

    let outcome = app
        .state
        .submission_handler
        .submit(PropertySubmission::create(
            sample_form(),
            vec![png_image("facade.png", 1600, 800)],
            app.admin.id,
        ))
        .await
        .unwrap();

    let (property, ..) = saved(outcome);
    let url = &property.details.images[0];
    let key = url.strip_prefix("memory://").unwrap();
    assert!(key.starts_with("properties/"));
    assert!(key.ends_with("_0_facade.png"));

    let object = app.storage.get(key).unwrap();
    assert_eq!(object.content_type, "image/jpeg");
    let decoded = image::load_from_memory(&object.bytes).unwrap();
    assert_eq!(decoded.width(), app.config.max_image_width);
    assert_eq!(decoded.height(), 400);
}

#[tokio::test]
async fn timed_out_upload_is_dropped_and_submission_still_succeeds() {
    let inner = InMemoryStorage::new();
    let storage = ScriptedStorage::new(inner.clone()).stalling("back.png");
    let app = TestApp::with_storage(inner, Arc::new(storage));

    let outcome = app
        .state
        .submission_handler
        .submit(PropertySubmission::create(
            sample_form(),
            vec![png_image("front.png", 320, 200), png_image("back.png", 320, 200)],
            app.admin.id,
        ))
        .await
        .unwrap();

    let (property, uploaded, failed, warning) = saved(outcome);
    assert_eq!(property.details.images.len(), 1);
    assert!(property.details.images[0].ends_with("_0_front.png"));
    assert_eq!((uploaded, failed), (1, 1));
    assert_eq!(warning.as_deref(), Some("1 of 2 images uploaded"));
}

#[tokio::test]
async fn editing_appends_new_images_after_existing_ones() {
    let app = TestApp::spawn();
    let handler = &app.state.submission_handler;

    let created = handler
        .submit(PropertySubmission::create(
            sample_form(),
            vec![png_image("a.png", 100, 100), png_image("b.png", 100, 100)],
            app.admin.id,
        ))
        .await
        .unwrap();
    let (original, ..) = saved(created);
    assert_eq!(original.details.images.len(), 2);

    let mut form = sample_form();
    form.name = "Skyline Residency Phase II".to_string();

    let edited = handler
        .submit(PropertySubmission::edit(
            original.id,
            form,
            vec![png_image("c.png", 100, 100)],
            app.admin.id,
        ))
        .await
        .unwrap();
    let (property, ..) = saved(edited);

    assert_eq!(property.id, original.id);
    assert_eq!(property.details.name, "Skyline Residency Phase II");
    assert_eq!(property.details.images.len(), 3);
    assert_eq!(property.details.images[..2], original.details.images[..]);
    assert!(property.details.images[2].ends_with("_0_c.png"));
    assert_eq!(property.created_at, original.created_at);
    assert_eq!(property.created_by, original.created_by);
    assert!(property.updated_at >= original.updated_at);
}

#[tokio::test]
async fn editing_without_files_keeps_the_image_list() {
    let app = TestApp::spawn();
    let handler = &app.state.submission_handler;

    let (original, ..) = saved(
        handler
            .submit(PropertySubmission::create(
                sample_form(),
                vec![png_image("a.png", 50, 50)],
                app.admin.id,
            ))
            .await
            .unwrap(),
    );
    let puts_before = app.storage.put_count();

    let (edited, uploaded, failed, warning) = saved(
        handler
            .submit(PropertySubmission::edit(original.id, sample_form(), Vec::new(), app.admin.id))
            .await
            .unwrap(),
    );

    assert_eq!(edited.details.images, original.details.images);
    assert_eq!((uploaded, failed), (0, 0));
    assert!(warning.is_none());
    assert_eq!(app.storage.put_count(), puts_before);
}

#[tokio::test]
async fn submission_without_files_makes_no_storage_calls() {
    let inner = InMemoryStorage::new();
    let storage = Arc::new(ScriptedStorage::new(inner.clone()));
    let app = TestApp::with_storage(inner, storage.clone());

    let (property, ..) = saved(
        app.state
            .submission_handler
            .submit(PropertySubmission::create(sample_form(), Vec::new(), app.admin.id))
            .await
            .unwrap(),
    );

    assert!(property.details.images.is_empty());
    assert_eq!(storage.attempts(), 0);
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn total_upload_failure_still_saves_with_warning() {
    let inner = InMemoryStorage::new();
    let storage = ScriptedStorage::new(inner.clone())
        .failing("a.png")
        .failing("b.png");
    let app = TestApp::with_storage(inner, Arc::new(storage));

    let (property, uploaded, failed, warning) = saved(
        app.state
            .submission_handler
            .submit(PropertySubmission::create(
                sample_form(),
                vec![png_image("a.png", 64, 64), png_image("b.png", 64, 64)],
                app.admin.id,
            ))
            .await
            .unwrap(),
    );

    assert!(property.details.images.is_empty());
    assert_eq!((uploaded, failed), (0, 2));
    assert!(warning.unwrap().starts_with("None of the 2 images"));
    assert_eq!(app.property_repo.len(), 1);
}

#[tokio::test]
async fn undecodable_file_is_uploaded_unchanged() {
    let app = TestApp::spawn();
    let raw = b"definitely not an image".to_vec();

    let (property, ..) = saved(
        app.state
            .submission_handler
            .submit(PropertySubmission::create(
                sample_form(),
                vec![ImageFile::new("scan.webp", raw.clone())],
                app.admin.id,
            ))
            .await
            .unwrap(),
    );

    let key = property.details.images[0].strip_prefix("memory://").unwrap();
    let object = app.storage.get(key).unwrap();
    assert_eq!(object.bytes, raw);
    assert_eq!(object.content_type, "image/webp");
}

#[tokio::test]
async fn invalid_form_is_rejected_before_any_upload() {
    let app = TestApp::spawn();
    let mut form = sample_form();
    form.name = "   ".to_string();

    let err = app
        .state
        .submission_handler
        .submit(PropertySubmission::create(form, vec![png_image("a.png", 10, 10)], app.admin.id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(err.invalid_fields(), vec!["name"]);
    assert_eq!(app.storage.put_count(), 0);
    assert!(app.property_repo.is_empty());
}

#[tokio::test]
async fn unknown_and_inactive_admins_are_forbidden() {
    let app = TestApp::spawn();
    let inactive = app.add_admin(false);

    for admin_id in [Uuid::new_v4(), inactive.id] {
        let err = app
            .state
            .submission_handler
            .submit(PropertySubmission::create(sample_form(), vec![png_image("a.png", 10, 10)], admin_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenAccess));
    }
    assert_eq!(app.storage.put_count(), 0);
}

#[tokio::test]
async fn editing_a_missing_property_is_not_found() {
    let app = TestApp::spawn();

    let err = app
        .state
        .submission_handler
        .submit(PropertySubmission::edit(Uuid::new_v4(), sample_form(), Vec::new(), app.admin.id))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn tracker_walks_every_state_and_ends_done() {
    let app = TestApp::spawn();
    let tracker = SubmissionTracker::new();
    let mut receiver = tracker.subscribe();
    assert_eq!(tracker.state(), SubmissionState::Idle);

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while receiver.changed().await.is_ok() {
            let state = *receiver.borrow_and_update();
            seen.push(state);
            if state.is_terminal() {
                break;
            }
        }
        seen
    });

    app.state
        .submission_handler
        .submit_tracked(
            PropertySubmission::create(
                sample_form(),
                vec![png_image("a.png", 20, 20), png_image("b.png", 20, 20)],
                app.admin.id,
            ),
            &tracker,
        )
        .await
        .unwrap();

    assert_eq!(tracker.state(), SubmissionState::Done);

    let seen = tokio::time::timeout(Duration::from_secs(1), collector)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.last(), Some(&SubmissionState::Done));
    assert!(!seen.contains(&SubmissionState::Failed));
}

#[tokio::test]
async fn store_failure_is_reported_as_failed_outcome() {
    let admin_repo = InMemoryAdminRepo::new();
    let admin = test_admin(true);
    admin_repo.insert_admin(admin.clone());

    let mut repo = MockPropertyRepo::new();
    repo.expect_create_property()
        .times(1)
        .returning(|_| Err(AppError::InternalError("connection reset".into())));

    let storage = InMemoryStorage::new();
    let handler = PropertySubmissionHandler::new(
        PersistenceWriter::new(repo, true),
        ParallelUploader::new(storage.clone(), Duration::from_secs(1)),
        admin_repo,
        ImageCompressor::new(800, 80),
        "properties",
    );
    let tracker = SubmissionTracker::new();

    let outcome = handler
        .submit_tracked(
            PropertySubmission::create(sample_form(), vec![png_image("a.png", 30, 30)], admin.id),
            &tracker,
        )
        .await
        .unwrap();

    match outcome {
        SubmissionOutcome::Failed { message } => assert!(message.contains("connection reset")),
        other => panic!("Expected failure, got {:?}", other),
    }
    assert_eq!(tracker.state(), SubmissionState::Failed);
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn verification_read_failure_does_not_fail_the_save() {
    let admin_repo = InMemoryAdminRepo::new();
    let admin = test_admin(true);
    admin_repo.insert_admin(admin.clone());

    let id = Uuid::new_v4();
    let mut repo = MockPropertyRepo::new();
    repo.expect_create_property().times(1).returning(move |_| Ok(id));
    repo.expect_get_property_by_id()
        .times(1)
        .returning(|_| Err(AppError::InternalError("replica lag".into())));

    let handler = PropertySubmissionHandler::new(
        PersistenceWriter::new(repo, true),
        ParallelUploader::new(InMemoryStorage::new(), Duration::from_secs(1)),
        admin_repo,
        ImageCompressor::new(800, 80),
        "properties",
    );

    let outcome = handler
        .submit(PropertySubmission::create(sample_form(), Vec::new(), admin.id))
        .await
        .unwrap();

    assert!(outcome.is_saved());
    assert_eq!(outcome.property().unwrap().id, id);
}
