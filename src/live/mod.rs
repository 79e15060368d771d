pub mod checker;
pub mod weather_feed;

pub use checker::{verify_api_key, LiveAnomalyChecker};
pub use weather_feed::{FeedStatus, OpenWeatherMapFeed, WeatherFeed};
