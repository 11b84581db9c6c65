use std::time::Duration;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::FetchError;
use crate::types::ListingSnapshot;

const USER_AGENT: &str = "deal-radar/0.1 (+https://example.com/)";
const FETCH_TIMEOUT_SECS: u64 = 12;
const FEED_BASE_URL: &str = "https://www.realtor.ca";

/// Live-source collaborator. The engine never calls this directly: the
/// caller turns any [`FetchError`] into an empty batch, which the engine
/// treats as a valid run.
pub async fn fetch_listings(
    source: &str,
    settings: &Settings,
) -> Result<Vec<ListingSnapshot>, FetchError> {
    match source {
        "public_demo" => Ok(Vec::new()),
        "realtor_public_poc" => fetch_realtor_public_poc(settings).await,
        other => Err(FetchError::ParseFailure(format!("unknown source: {other}"))),
    }
}

async fn fetch_realtor_public_poc(settings: &Settings) -> Result<Vec<ListingSnapshot>, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::ParseFailure(e.to_string()))?;

    let robots = fetch_robots(&client, FEED_BASE_URL).await?;
    if !robots_allows(&robots, "/") {
        return Err(FetchError::Disallowed(FEED_BASE_URL.to_string()));
    }

    let mut listings = Vec::new();
    for city in settings
        .target_cities
        .iter()
        .take(settings.limits.max_search_pages)
    {
        let path = format!("/listings.json?city={city}");
        if !robots_allows(&robots, &path) {
            warn!(city = %city, "robots.txt disallows city feed, skipping");
            continue;
        }
        let url = format!("{FEED_BASE_URL}{path}");
        match fetch_city_feed(&client, &url).await {
            Ok(mut batch) => {
                info!(city = %city, count = batch.len(), "fetched city feed");
                listings.append(&mut batch);
            }
            Err(e) => warn!(city = %city, error = %e, "city feed failed, continuing"),
        }
        if listings.len() >= settings.limits.max_detail_pages {
            listings.truncate(settings.limits.max_detail_pages);
            break;
        }
    }
    Ok(listings)
}

async fn fetch_city_feed(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<ListingSnapshot>, FetchError> {
    let response = client.get(url).send().await.map_err(classify_reqwest)?;
    let body: serde_json::Value = response.json().await.map_err(classify_reqwest)?;
    let items = body
        .as_array()
        .ok_or_else(|| FetchError::ParseFailure("city feed was not a JSON array".to_string()))?;

    // Individual malformed entries are skipped, not fatal.
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<ListingSnapshot>(item.clone()) {
            Ok(snapshot) => out.push(snapshot),
            Err(e) => warn!(error = %e, "skipping malformed feed entry"),
        }
    }
    Ok(out)
}

async fn fetch_robots(client: &reqwest::Client, base_url: &str) -> Result<String, FetchError> {
    let url = format!("{base_url}/robots.txt");
    let response = client.get(&url).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout(url.clone())
        } else {
            FetchError::RobotsUnavailable(base_url.to_string())
        }
    })?;
    if !response.status().is_success() {
        return Err(FetchError::RobotsUnavailable(base_url.to_string()));
    }
    response
        .text()
        .await
        .map_err(|_| FetchError::RobotsUnavailable(base_url.to_string()))
}

fn classify_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else {
        FetchError::ParseFailure(e.to_string())
    }
}

/// Minimal robots.txt check: honors `Disallow` prefixes in the `*` group
/// and in any group naming our user agent.
fn robots_allows(robots: &str, path: &str) -> bool {
    let mut applies = false;
    for line in robots.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(agent) = line.strip_prefix("User-agent:").map(str::trim) {
            applies = agent == "*" || USER_AGENT.starts_with(agent);
        } else if applies {
            if let Some(prefix) = line.strip_prefix("Disallow:").map(str::trim) {
                if !prefix.is_empty() && path.starts_with(prefix) {
                    return false;
                }
            }
        }
    }
    true
}
