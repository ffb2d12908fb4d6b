//! E2E tests for playlists

mod common;

use common::{TestServer, TestUser};
use reqwest::Method;
use serde_json::json;

async fn create_playlist(server: &TestServer, user: &TestUser, name: &str) -> String {
    let (status, body) = server
        .send(
            Method::POST,
            user,
            "/playlist",
            Some(json!({ "name": name, "description": format!("{name} list") })),
        )
        .await;
    assert_eq!(status, 201);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_playlist_membership() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let first = server.publish_video(&alice, "First").await;
    let second = server.publish_video(&alice, "Second").await;
    let playlist_id = create_playlist(&server, &alice, "Favourites").await;

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/add/{second}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalVideos"], 1);

    server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/add/{first}/{playlist_id}"),
            None,
        )
        .await;

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/add/{first}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["message"], "Video already in playlist");

    // Insertion order is kept
    let (status, body) = server.get(&alice, &format!("/playlist/{playlist_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Favourites");
    assert_eq!(body["data"]["owner"]["username"], "alice");
    let videos = body["data"]["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["id"], second.as_str());
    assert_eq!(videos[1]["id"], first.as_str());

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/remove/{second}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalVideos"], 1);

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/remove/{second}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Video not found in playlist");
}

#[tokio::test]
async fn test_playlist_owner_checks() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let video_id = server.publish_video(&bob, "Bob video").await;
    let playlist_id = create_playlist(&server, &alice, "Mine").await;

    let (status, _) = server
        .send(
            Method::PATCH,
            &bob,
            &format!("/playlist/add/{video_id}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = server
        .send(
            Method::PATCH,
            &bob,
            &format!("/playlist/{playlist_id}"),
            Some(json!({ "name": "Stolen", "description": "x" })),
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = server
        .send(Method::DELETE, &bob, &format!("/playlist/{playlist_id}"), None)
        .await;
    assert_eq!(status, 403);

    // Anyone's published video can go in your own playlist
    let (status, _) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/add/{video_id}/{playlist_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_update_and_delete_playlist() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let playlist_id = create_playlist(&server, &alice, "Draft").await;

    let (status, _) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/{playlist_id}"),
            Some(json!({ "name": "", "description": "x" })),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/playlist/{playlist_id}"),
            Some(json!({ "name": "Final", "description": "Ready" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Final");

    let (status, _) = server
        .send(Method::DELETE, &alice, &format!("/playlist/{playlist_id}"), None)
        .await;
    assert_eq!(status, 200);

    let (status, _) = server.get(&alice, &format!("/playlist/{playlist_id}")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_user_playlists() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    create_playlist(&server, &alice, "One").await;
    create_playlist(&server, &alice, "Two").await;

    let (status, body) = server.get(&bob, &format!("/playlist/user/{}", alice.id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = server.get(&bob, &format!("/playlist/user/{}", bob.id)).await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = server
        .get(&bob, "/playlist/user/01HZZZZZZZZZZZZZZZZZZZZZZZ")
        .await;
    assert_eq!(status, 404);

    let (status, body) = server
        .send(Method::POST, &bob, "/playlist", Some(json!({ "name": "No description" })))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Name and description are required");
}

#[tokio::test]
async fn test_unpublished_video_disappears_from_playlist_and_history() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let video_id = server.publish_video(&alice, "Soon private").await;
    let playlist_id = create_playlist(&server, &bob, "Later").await;

    server
        .send(
            Method::PATCH,
            &bob,
            &format!("/playlist/add/{video_id}/{playlist_id}"),
            None,
        )
        .await;
    server.get(&bob, &format!("/videos/{video_id}")).await;

    let (status, _) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/videos/toggle-publish/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = server.get(&bob, &format!("/playlist/{playlist_id}")).await;
    assert_eq!(status, 200);
    assert!(body["data"]["videos"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["totalVideos"], 0);

    let (_, body) = server.get(&bob, &format!("/playlist/user/{}", bob.id)).await;
    assert!(body["data"][0]["videos"].as_array().unwrap().is_empty());

    let (_, body) = server.get(&bob, "/users/get-user-watch-history").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = server.get(&alice, &format!("/playlist/{playlist_id}")).await;
    assert_eq!(body["data"]["totalVideos"], 1);
}
