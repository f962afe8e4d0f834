//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// The application name, as advertised to the record store in the `X-Client-Info` header.
/// Feel free to override it when initing this library.
pub static APP_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("bookbag".to_string())));

/// The application version advertised along [`APP_NAME`].
/// Feel free to override it when initing this library.
pub static APP_VERSION: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(env!("CARGO_PKG_VERSION").to_string())));

/// The `X-Client-Info` header value (e.g. `bookbag@0.3.0`)
pub fn client_info() -> String {
    let name = APP_NAME.lock().unwrap().clone();
    let version = APP_VERSION.lock().unwrap().clone();
    format!("{}@{}", name, version)
}
