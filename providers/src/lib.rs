//! External collaborators for FarmLink.
//!
//! Each client implements one environment trait from `farmlink-core`:
//!
//! - [`RazorpayGateway`]: [`PaymentGateway`](farmlink_core::PaymentGateway)
//! - [`OpenWeatherClient`]: [`WeatherProvider`](farmlink_core::WeatherProvider)
//! - [`ZoomMeetingProvider`] and [`GoogleMeetProvider`]:
//!   [`MeetingLinkProvider`](farmlink_core::MeetingLinkProvider)
//! - [`SmtpNotifier`] and [`ConsoleNotifier`]: [`Notifier`](farmlink_core::Notifier)
//!
//! Clients built without credentials still construct; their calls fail with
//! a `NotConfigured` error instead of reaching the network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod email;
pub mod google_meet;
mod http;
pub mod openweather;
pub mod razorpay;
pub mod zoom;

pub use email::{ConsoleNotifier, SmtpNotifier, SmtpSettings};
pub use google_meet::GoogleMeetProvider;
pub use http::build_client;
pub use openweather::OpenWeatherClient;
pub use razorpay::{RazorpayCredentials, RazorpayGateway};
pub use zoom::{ZoomCredentials, ZoomMeetingProvider};
