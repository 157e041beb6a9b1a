pub mod admin;
pub mod auth;
pub mod bookmark;
pub mod catalog;
pub mod notification;
pub mod otp;
pub mod rating;
pub mod shared;
