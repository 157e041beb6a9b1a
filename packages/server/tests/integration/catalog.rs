use serde_json::json;

use crate::common::{TestApp, routes};

async fn create_genre(app: &TestApp, token: &str, name: &str) -> i32 {
    let res = app
        .post_with_token(routes::GENRES, &json!({"name": name}), token)
        .await;
    assert_eq!(res.status, 201, "create_genre failed: {}", res.text);
    res.id()
}

mod movies {
    use super::*;

    #[tokio::test]
    async fn create_movie_with_genres() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let drama = create_genre(&app, &admin, "Drama").await;
        let crime = create_genre(&app, &admin, "Crime").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({
                    "title": "The Wire",
                    "kind": "series",
                    "release_year": 2002,
                    "genre_ids": [drama, crime],
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "the-wire");
        assert_eq!(res.body["kind"], "series");
        assert_eq!(res.body["rating_avg"], 0.0);
        assert_eq!(res.body["rating_count"], 0);
        assert_eq!(res.body["genres"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_titles_get_distinct_slugs() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;

        let first = app.create_movie(&admin, "Dune").await;
        let second = app.create_movie(&admin, "Dune").await;

        let a = app.get_without_token(&routes::movie(first)).await;
        let b = app.get_without_token(&routes::movie(second)).await;
        assert_eq!(a.body["slug"], "dune");
        assert_eq!(b.body["slug"], "dune-2");
    }

    #[tokio::test]
    async fn unknown_genre_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "Ghost", "genre_ids": [4242]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn viewer_cannot_create_movie() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(routes::MOVIES, &json!({"title": "Nope"}), &alice)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;

        let res = app
            .post_with_token(routes::MOVIES, &json!({"title": "   "}), &admin)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn update_cannot_touch_rating_summary() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let movie_id = app.create_movie(&admin, "Memento").await;
        let alice = app.create_authenticated_user("alice").await;
        app.rate(&alice, movie_id, 5).await;

        let res = app
            .patch_with_token(
                &routes::movie(movie_id),
                &json!({"release_year": null, "rating_avg": 1.0, "rating_count": 40}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["release_year"], serde_json::Value::Null);
        assert_eq!(app.stored_summary(movie_id).await, (5.0, 1));
    }

    #[tokio::test]
    async fn delete_movie_removes_dependents() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let movie_id = app.create_movie(&admin, "Gone").await;
        app.rate(&alice, movie_id, 3).await;
        app.post_with_token(routes::BOOKMARKS, &json!({"movie_id": movie_id}), &alice)
            .await;

        let res = app.delete_with_token(&routes::movie(movie_id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_without_token(&routes::movie(movie_id)).await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice).await;
        assert_eq!(res.body["unread"], 0);
        let res = app.get_with_token(routes::BOOKMARKS, &alice).await;
        assert_eq!(res.body.as_array().unwrap().len(), 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        app.create_movie(&admin, "The Matrix").await;
        app.create_movie(&admin, "Matrix Reloaded").await;
        app.create_movie(&admin, "Amelie").await;

        let res = app
            .get_without_token(&format!("{}?search=MATRIX", routes::MOVIES))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn filter_by_genre_slug() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let horror = create_genre(&app, &admin, "Horror").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "Hereditary", "genre_ids": [horror]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201);
        app.create_movie(&admin, "Paddington").await;

        let res = app
            .get_without_token(&format!("{}?genre=horror", routes::MOVIES))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Hereditary");

        let res = app
            .get_without_token(&format!("{}?genre=western", routes::MOVIES))
            .await;
        assert_eq!(res.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn sort_by_rating() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let low = app.create_movie(&admin, "Low").await;
        let high = app.create_movie(&admin, "High").await;
        app.rate(&alice, low, 2).await;
        app.rate(&alice, high, 5).await;

        let res = app
            .get_without_token(&format!("{}?sort_by=rating_avg", routes::MOVIES))
            .await;
        assert_eq!(res.body["data"][0]["id"], high);
        assert_eq!(res.body["data"][1]["id"], low);

        let res = app
            .get_without_token(&format!("{}?sort_by=popularity", routes::MOVIES))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn pagination_is_clamped() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        for i in 0..3 {
            app.create_movie(&admin, &format!("Movie {i}")).await;
        }

        let res = app
            .get_without_token(&format!("{}?per_page=2&page=2", routes::MOVIES))
            .await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app
            .get_without_token(&format!("{}?per_page=1000", routes::MOVIES))
            .await;
        assert_eq!(res.body["pagination"]["per_page"], 100);

        let res = app
            .get_without_token(&format!(
                "{}?page=1844674407370955161&per_page=100",
                routes::MOVIES
            ))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 3);
    }
}

mod episodes {
    use super::*;

    #[tokio::test]
    async fn episodes_are_listed_in_order_and_unique() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let movie_id = app.create_movie(&admin, "Lost").await;

        for (season, number) in [(2, 1), (1, 2), (1, 1)] {
            let res = app
                .post_with_token(
                    &routes::movie_episodes(movie_id),
                    &json!({"season": season, "episode_number": number, "title": "Ep"}),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .post_with_token(
                &routes::movie_episodes(movie_id),
                &json!({"season": 1, "episode_number": 1}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);

        let res = app.get_without_token(&routes::movie_episodes(movie_id)).await;
        let order = res.body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| (e["season"].as_i64().unwrap(), e["episode_number"].as_i64().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);

        let res = app.get_without_token(&routes::movie(movie_id)).await;
        assert_eq!(res.body["episodes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn progress_is_replaced_and_counted_on_profile() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let movie_id = app.create_movie(&admin, "Dark").await;
        let res = app
            .post_with_token(
                &routes::movie_episodes(movie_id),
                &json!({"episode_number": 1}),
                &admin,
            )
            .await;
        let episode_id = res.id();

        for minutes in [30, 90] {
            let res = app
                .put_with_token(
                    &routes::episode_progress(episode_id),
                    &json!({"watched_minutes": minutes}),
                    &alice,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["watched_minutes"], minutes);
        }

        let me = app.get_with_token(routes::ME, &alice).await;
        assert_eq!(me.body["progress"]["watched_episodes_count"], 1);
        assert_eq!(me.body["progress"]["total_watched_hours"], 1.5);

        let res = app
            .put_with_token(
                &routes::episode_progress(9999),
                &json!({"watched_minutes": 5}),
                &alice,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}

mod banners {
    use super::*;

    #[tokio::test]
    async fn banner_lifecycle() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let movie_id = app.create_movie(&admin, "Avatar").await;

        let res = app
            .post_with_token(
                routes::BANNERS,
                &json!({"movie_id": movie_id, "photo_url": "https://img.example.com/a.jpg"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let banner_id = res.id();

        let res = app.get_without_token(routes::BANNERS).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(res.body[0]["movie"]["title"], "Avatar");

        let res = app.delete_with_token(&routes::banner(banner_id), &admin).await;
        assert_eq!(res.status, 204);
        let res = app.get_without_token(routes::BANNERS).await;
        assert_eq!(res.body.as_array().unwrap().len(), 0);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn dashboard_counts_and_rankings() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin").await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let drama = create_genre(&app, &admin, "Drama").await;
        create_genre(&app, &admin, "Western").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "Popular", "genre_ids": [drama]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let popular = res.id();
        let niche = app.create_movie(&admin, "Niche").await;
        app.create_movie(&admin, "Unrated").await;
        app.post_with_token(
            &routes::movie_episodes(popular),
            &json!({"episode_number": 1}),
            &admin,
        )
        .await;

        let res = app
            .post_with_token(
                routes::RATINGS,
                &json!({"movie_id": popular, "score": 3, "comment": "Fine"}),
                &alice,
            )
            .await;
        assert_eq!(res.status, 201);
        app.rate(&bob, popular, 4).await;
        app.rate(&alice, niche, 5).await;

        let res = app.get_with_token(routes::DASHBOARD, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let totals = &res.body["totals"];
        assert_eq!(totals["users"], 3);
        assert_eq!(totals["movies"], 3);
        assert_eq!(totals["recent_movies"], 3);
        assert_eq!(totals["episodes"], 1);
        assert_eq!(totals["genres"], 2);
        assert_eq!(totals["ratings"], 3);
        assert_eq!(totals["reviews"], 1);
        assert_eq!(res.body["average_score"], 4.0);

        // Ranked by number of ratings, not by average.
        let top = res.body["top_movies"].as_array().unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["id"], popular);
        assert_eq!(top[1]["id"], niche);

        let genres = res.body["top_genres"].as_array().unwrap();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0]["name"], "Drama");
        assert_eq!(genres[0]["movie_count"], 1);
        assert_eq!(genres[1]["name"], "Western");
        assert_eq!(genres[1]["movie_count"], 0);

        let res = app.get_with_token(routes::DASHBOARD, &alice).await;
        assert_eq!(res.status, 403);
    }
}
