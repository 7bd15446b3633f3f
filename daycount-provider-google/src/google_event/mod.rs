mod to_google;

pub use to_google::ToGoogle;
