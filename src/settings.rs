//! Settings for the demo binary.
//!
//! These are not used by the library itself: real applications are expected to pass
//! their own endpoint and API key when building a [`RemoteStore`](crate::store::RemoteStore).

pub static URL: &str = "https://example.supabase.co";
pub static API_KEY: &str = "public-anon-key";
