use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/genres", genre_routes())
        .nest("/movies", movie_routes())
        .nest("/episodes", episode_routes())
        .nest("/banners", banner_routes())
        .nest("/ratings", rating_routes())
        .nest("/bookmarks", bookmark_routes())
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me, handlers::auth::update_me))
        .routes(routes!(handlers::otp::send_otp))
        .routes(routes!(handlers::otp::verify_otp))
        .routes(routes!(handlers::otp::request_password_reset))
        .routes(routes!(handlers::otp::confirm_password_reset))
}

fn genre_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::genre::list_genres,
        handlers::genre::create_genre
    ))
}

fn movie_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::movie::list_movies,
            handlers::movie::create_movie
        ))
        .routes(routes!(
            handlers::movie::get_movie,
            handlers::movie::update_movie,
            handlers::movie::delete_movie
        ))
        .routes(routes!(
            handlers::episode::list_episodes,
            handlers::episode::create_episode
        ))
        .routes(routes!(handlers::rating::list_movie_ratings))
        .routes(routes!(handlers::rating::list_movie_reviews))
}

fn episode_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::episode::update_progress))
}

fn banner_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::banner::list_banners,
            handlers::banner::create_banner
        ))
        .routes(routes!(handlers::banner::delete_banner))
}

fn rating_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::rating::submit_rating))
        .routes(routes!(
            handlers::rating::update_rating,
            handlers::rating::delete_rating
        ))
}

fn bookmark_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::bookmark::list_bookmarks,
            handlers::bookmark::create_bookmark
        ))
        .routes(routes!(handlers::bookmark::delete_bookmark))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::notification::list_notifications))
        .routes(routes!(handlers::notification::unread_count))
        .routes(routes!(handlers::notification::mark_all_read))
        .routes(routes!(handlers::notification::mark_read))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::dashboard))
        .routes(routes!(handlers::admin::recompute_ratings))
        .routes(routes!(handlers::admin::rerun_fanout))
}
