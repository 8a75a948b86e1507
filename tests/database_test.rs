// ABOUTME: Store-level tests against a file-backed database with a real connection pool
// ABOUTME: Checks rating aggregates under concurrent reviews and message paging order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::create_test_coach;
use reviewmycoach_server::database::{CreateReviewRequest, Database, SendMessageRequest};
use tempfile::TempDir;

async fn file_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("reviewmycoach.db").display());
    let database = Database::new(&url).await.unwrap();
    (dir, database)
}

fn review(rating: f64) -> CreateReviewRequest {
    CreateReviewRequest {
        rating: Some(rating),
        review_text: "Patient, prepared and always on time".to_owned(),
        sport: None,
    }
}

#[tokio::test]
async fn test_concurrent_reviews_keep_aggregate_exact() {
    let (_dir, database) = file_database().await;
    create_test_coach(&database, "coach-1", "CourtCoach", &["Tennis"], Some(60.0)).await;

    let ratings = [5.0, 4.0, 3.0, 5.0, 4.0, 2.0];
    let mut handles = Vec::new();
    for (i, rating) in ratings.into_iter().enumerate() {
        let database = database.clone();
        handles.push(tokio::spawn(async move {
            let student = format!("student-{i}");
            database
                .reviews()
                .create("coach-1", &student, &student, &review(rating))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let coach = database.coaches().get("coach-1").await.unwrap().unwrap();
    assert_eq!(coach.total_reviews, 6);
    assert!((coach.average_rating - 3.8).abs() < f64::EPSILON);

    let repaired = database.reviews().recompute("coach-1").await.unwrap();
    assert_eq!(repaired.total_reviews, 6);
    assert!((repaired.average_rating - 3.8).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_username_is_stored_lowercase() {
    let (_dir, database) = file_database().await;
    let coach = create_test_coach(&database, "coach-1", "CourtCoach", &["Tennis"], None).await;
    assert_eq!(coach.username, "courtcoach");
    assert_eq!(coach.id, "coach-1");

    let coaches = database.coaches();
    assert!(!coaches.username_available("COURTCOACH").await.unwrap());
    assert!(coaches.get_by_username("CourtCoach").await.unwrap().is_some());
}

#[tokio::test]
async fn test_message_page_is_latest_oldest_first() {
    let (_dir, database) = file_database().await;
    let messaging = database.messaging();

    for i in 0..5 {
        messaging
            .send(
                "student-1",
                "Sam",
                &SendMessageRequest {
                    recipient_id: "coach-1".to_owned(),
                    message: format!("message {i}"),
                    conversation_id: None,
                },
            )
            .await
            .unwrap();
    }

    let conversation_id = reviewmycoach_server::models::Conversation::id_for("student-1", "coach-1");
    let page = messaging.list_messages(&conversation_id, 3).await.unwrap();
    let bodies: Vec<&str> = page.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(bodies, vec!["message 2", "message 3", "message 4"]);

    assert_eq!(messaging.count_unread("coach-1").await.unwrap(), 5);
    assert_eq!(messaging.mark_read(&conversation_id, "coach-1").await.unwrap(), 5);
    assert_eq!(messaging.count_unread("coach-1").await.unwrap(), 0);
    assert_eq!(messaging.mark_read(&conversation_id, "coach-1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_colliding_conversation_ids_stay_separate() {
    let (_dir, database) = file_database().await;
    let messaging = database.messaging();
    let send = |recipient: &str, body: &str| SendMessageRequest {
        recipient_id: recipient.to_owned(),
        message: body.to_owned(),
        conversation_id: None,
    };

    messaging
        .send("a", "A", &send("b_c", "secret for b_c"))
        .await
        .unwrap();
    let collision = messaging.send("a_b", "AB", &send("c", "hi c")).await;
    assert_eq!(collision.err().map(|e| e.http_status()), Some(403));

    assert!(messaging.list_conversations("a_b").await.unwrap().is_empty());
    let page = messaging.list_messages("a_b_c", 10).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].message, "secret for b_c");
    assert_eq!(messaging.count_unread("c").await.unwrap(), 0);
}
