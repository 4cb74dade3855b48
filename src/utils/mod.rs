pub mod auth;
pub mod mailer;
pub mod razorpay;
pub mod signature;
