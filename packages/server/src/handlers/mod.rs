pub mod admin;
pub mod auth;
pub mod banner;
pub mod bookmark;
pub mod episode;
pub mod genre;
pub mod movie;
pub mod notification;
pub mod otp;
pub mod rating;
