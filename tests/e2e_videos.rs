//! E2E tests for video publishing, watching and listing

mod common;

use common::{TestServer, image_part, split, video_part};
use reqwest::Method;
use reqwest::multipart::Form;

#[tokio::test]
async fn test_publish_video_stores_media_and_duration() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let form = Form::new()
        .text("title", "Intro")
        .text("description", "Channel intro")
        .part("videoFile", video_part())
        .part("thumbnail", image_part("thumb.png"));
    let response = server
        .client
        .post(server.api("/videos/publish-video"))
        .bearer_auth(&alice.access_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let (status, body) = split(response).await;

    assert_eq!(status, 201);
    let video = &body["data"];
    assert_eq!(video["title"], "Intro");
    assert_eq!(video["ownerId"], alice.id.as_str());
    assert_eq!(video["views"], 0);
    assert_eq!(video["isPublished"], true);
    assert_eq!(video["duration"], 2.5);
    assert!(video["videoFile"].as_str().unwrap().ends_with(".mp4"));
    assert!(video["thumbnail"].as_str().unwrap().contains("/media/thumbnails/"));
}

#[tokio::test]
async fn test_publish_requires_files() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let form = Form::new()
        .text("title", "Intro")
        .text("description", "Channel intro")
        .part("thumbnail", image_part("thumb.png"));
    let response = server
        .client
        .post(server.api("/videos/publish-video"))
        .bearer_auth(&alice.access_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let (status, body) = split(response).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Video file is required");

    let wrong_type = Form::new()
        .text("title", "Intro")
        .text("description", "Channel intro")
        .part("videoFile", image_part("not-a-video.png"))
        .part("thumbnail", image_part("thumb.png"));
    let response = server
        .client
        .post(server.api("/videos/publish-video"))
        .bearer_auth(&alice.access_token)
        .multipart(wrong_type)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_watching_counts_one_view_per_user() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let video_id = server.publish_video(&alice, "Intro").await;

    let (status, first) = server.get(&bob, &format!("/videos/{video_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["views"], 1);
    assert_eq!(first["data"]["owner"]["username"], "alice");
    assert_eq!(first["data"]["likesCount"], 0);
    assert_eq!(first["data"]["isLiked"], false);

    let (_, second) = server.get(&bob, &format!("/videos/{video_id}")).await;
    assert_eq!(second["data"]["views"], 1);

    let (_, by_owner) = server.get(&alice, &format!("/videos/{video_id}")).await;
    assert_eq!(by_owner["data"]["views"], 2);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let (status, body) = server.get(&alice, "/videos/01HZZZZZZZZZZZZZZZZZZZZZZZ").await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_list_videos_paginates_and_sorts() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    for title in ["Charlie", "Alpha", "Bravo"] {
        server.publish_video(&alice, title).await;
    }

    let (status, body) = server.get(&alice, "/videos?page=1&limit=2").await;
    assert_eq!(status, 200);
    let page = &body["data"];
    assert_eq!(page["totalItems"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    // Newest first by default
    assert_eq!(page["items"][0]["title"], "Bravo");

    let (_, body) = server
        .get(&alice, "/videos?sortBy=title&sortType=asc&limit=10")
        .await;
    let titles: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);

    let (_, body) = server.get(&alice, "/videos?page=3&limit=2").await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_videos_filters_by_owner() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    server.publish_video(&alice, "Alice video").await;
    server.publish_video(&bob, "Bob video").await;

    let (status, body) = server
        .get(&alice, &format!("/videos?userId={}", bob.id))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Bob video");
}

#[tokio::test]
async fn test_list_videos_rejects_bad_parameters() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;

    let (status, _) = server.get(&alice, "/videos?sortBy=password").await;
    assert_eq!(status, 400);

    let (status, _) = server.get(&alice, "/videos?sortType=sideways").await;
    assert_eq!(status, 400);

    let (status, _) = server.get(&alice, "/videos?page=0").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_only_owner_can_modify_video() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let mallory = server.create_user("mallory").await;
    let video_id = server.publish_video(&alice, "Intro").await;

    let form = Form::new()
        .text("videoId", video_id.clone())
        .text("title", "Hijacked")
        .text("description", "mine now");
    let response = server
        .client
        .patch(server.api("/videos/update-video"))
        .bearer_auth(&mallory.access_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let (status, _) = server
        .send(
            Method::DELETE,
            &mallory,
            &format!("/videos/delete-video/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = server
        .send(
            Method::PATCH,
            &mallory,
            &format!("/videos/toggle-publish/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_owner_updates_video_details() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let video_id = server.publish_video(&alice, "Intro").await;

    let form = Form::new()
        .text("videoId", video_id.clone())
        .text("title", "Better intro")
        .text("description", "Now with sound")
        .part("thumbnail", image_part("new-thumb.png"));
    let response = server
        .client
        .patch(server.api("/videos/update-video"))
        .bearer_auth(&alice.access_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let (status, body) = split(response).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["title"], "Better intro");
    assert_eq!(body["data"]["description"], "Now with sound");

    let blank = Form::new()
        .text("videoId", video_id)
        .text("title", " ")
        .text("description", "x");
    let response = server
        .client
        .patch(server.api("/videos/update-video"))
        .bearer_auth(&alice.access_token)
        .multipart(blank)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_unpublished_video_is_hidden_from_others() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let video_id = server.publish_video(&alice, "Draft").await;

    let (status, body) = server
        .send(
            Method::PATCH,
            &alice,
            &format!("/videos/toggle-publish/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["isPublished"], false);
    assert_eq!(body["message"], "Video is now unpublished");

    let (status, _) = server.get(&bob, &format!("/videos/{video_id}")).await;
    assert_eq!(status, 404);

    let (_, body) = server.get(&bob, "/videos").await;
    assert_eq!(body["data"]["totalItems"], 0);

    let (_, body) = server.get(&alice, "/videos").await;
    assert_eq!(body["data"]["totalItems"], 1);

    let (status, _) = server.get(&alice, &format!("/videos/{video_id}")).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_delete_video() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let video_id = server.publish_video(&alice, "Short-lived").await;

    let (status, _) = server
        .send(
            Method::DELETE,
            &alice,
            &format!("/videos/delete-video/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = server.get(&alice, &format!("/videos/{video_id}")).await;
    assert_eq!(status, 404);

    let (status, _) = server
        .send(
            Method::DELETE,
            &alice,
            &format!("/videos/delete-video/{video_id}"),
            None,
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_dashboard_reports_channel_stats() {
    let server = TestServer::new().await;
    let alice = server.create_user("alice").await;
    let bob = server.create_user("bob").await;
    let video_id = server.publish_video(&alice, "Intro").await;
    server.publish_video(&alice, "Second").await;

    server.get(&bob, &format!("/videos/{video_id}")).await;
    server
        .send(Method::POST, &bob, &format!("/likes/toggle/v/{video_id}"), None)
        .await;
    server
        .send(Method::POST, &bob, &format!("/subscriptions/c/{}", alice.id), None)
        .await;

    let (status, body) = server.get(&alice, "/dashboard/stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalChannelVideos"], 2);
    assert_eq!(body["data"]["totalChannelViews"], 1);
    assert_eq!(body["data"]["totalChannelSubscribers"], 1);
    assert_eq!(body["data"]["totalChannelLikes"], 1);

    let (status, body) = server.get(&alice, "/dashboard/videos").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = server.get(&bob, "/dashboard/stats").await;
    assert_eq!(body["data"]["totalChannelVideos"], 0);
}
