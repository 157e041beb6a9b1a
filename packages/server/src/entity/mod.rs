pub mod banner;
pub mod bookmark;
pub mod episode;
pub mod episode_progress;
pub mod genre;
pub mod movie;
pub mod movie_genre;
pub mod notification;
pub mod otp_code;
pub mod rating;
pub mod role;
pub mod role_permission;
pub mod user;
