use once_cell::sync::Lazy;
use reqwest::Client;

// No request timeout: generation calls block until the remote service answers
// or the connection drops.
static HTTP_CLIENT: Lazy<Client> =
    Lazy::new(|| Client::builder().build().expect("Failed to build HTTP client"));

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
