
mod auth;
mod bookmark;
mod catalog;
mod notification;
mod otp;
