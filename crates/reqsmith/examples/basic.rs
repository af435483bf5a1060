//! Basic usage example for reqsmith
//!
//! This example demonstrates:
//! - Creating a client from a base URL
//! - Selecting a JSON decoder and reading into a typed success target
//! - Query parameters that live for exactly one request
//! - Posting a JSON body and inspecting the echoed response
//!
//! Run with: cargo run --example basic
//!
//! The requests go to <https://httpbin.org>; set `HTTPBIN_URL` to point the
//! example at a local instance instead.

use std::collections::HashMap;

use reqsmith::{Client, JSON_CONTENT_TYPE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct UserInfo {
    name: String,
    age: u8,
    hobbies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GetEcho {
    args: HashMap<String, String>,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct PostEcho {
    json: Option<serde_json::Value>,
    url: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("HTTPBIN_URL").unwrap_or_else(|_| "https://httpbin.org".to_string());

    let mut client = Client::new(&base_url)?;
    client.accept(JSON_CONTENT_TYPE);

    // One-shot query parameters: sent with this GET, cleared afterwards.
    println!("=== GET /get with query parameters ===");
    client
        .add_query_param("name", "Jonah Doe")
        .add_query_param("hobbies", "Bike");

    let mut get_echo = GetEcho::default();
    client.get("/get", Some(&mut get_echo), None::<&mut ()>)?;
    println!("requested: {}", get_echo.url);
    println!("server saw args: {:?}", get_echo.args);
    println!("status: {}", client.status_code());

    println!("\n=== POST /post with a JSON body ===");
    let user = UserInfo {
        name: "Jonah Doe".to_string(),
        age: 33,
        hobbies: vec!["Bike".to_string(), "Trekking".to_string()],
    };

    let mut post_echo = PostEcho::default();
    client
        .body_as_json(&user)
        .post("/post", Some(&mut post_echo), None::<&mut ()>)?;
    println!("requested: {}", post_echo.url);
    println!("server echoed: {:?}", post_echo.json);
    println!("status: {}", client.status_code());

    Ok(())
}
