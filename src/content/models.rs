//! Normalized catalogue items.
//!
//! The upstream schema varies between endpoints, so each field is taken from
//! the first candidate key holding a non-empty value.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover: String,
    pub author: String,
    pub categories: Vec<Category>,
    pub total_episodes: u64,
    pub status: &'static str,
    pub age_gate: u64,
    pub play_count: u64,
    pub digg_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub duration: u64,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover: String,
    pub total_episodes: u64,
    pub status: &'static str,
    pub age_gate: u64,
    pub categories: Vec<Category>,
    pub episodes: Vec<Episode>,
}

impl ContentItem {
    /// Normalizes one entry of an upstream `books` list.
    pub fn from_upstream(item: &Value) -> Self {
        let ongoing = item.get("book_status").and_then(Value::as_str) == Some("1")
            || item.get("series_status").and_then(Value::as_u64) == Some(1);

        Self {
            id: first_string(item, &["book_id", "series_id", "series_id_str"]),
            title: first_string(item, &["book_name", "series_title", "name"]),
            description: first_string(item, &["abstract", "series_intro", "sub_abstract"]),
            cover: first_string(item, &["cover", "series_cover", "thumb_url"]),
            author: first_string(item, &["author"]),
            categories: parse_categories(item.get("category_info")),
            total_episodes: first_u64(item, &["episode_cnt", "total_episodes"]).unwrap_or(1),
            status: status_label(ongoing),
            age_gate: first_u64(item, &["age_gate"]).unwrap_or(0),
            play_count: first_u64(item, &["series_play_cnt"]).unwrap_or(0),
            digg_count: first_u64(item, &["followed_cnt", "digg_cnt"]).unwrap_or(0),
        }
    }

    /// Upstream ids used to filter watched items.
    pub fn raw_id(item: &Value) -> String {
        first_string(item, &["book_id", "series_id"])
    }
}

impl ContentDetail {
    /// Normalizes an upstream detail payload (already unwrapped from `data`).
    pub fn from_upstream(id: &str, data: &Value) -> Self {
        let video = data.get("video_data").unwrap_or(&Value::Null);

        let episodes: Vec<Episode> = video
            .get("video_list")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .enumerate()
                    .map(|(i, v)| Episode {
                        id: non_empty(first_string(v, &["vid_id", "video_id"]))
                            .unwrap_or_else(|| format!("{id}_{i}")),
                        title: non_empty(first_string(v, &["video_title"]))
                            .unwrap_or_else(|| format!("Episode {}", i + 1)),
                        cover: first_string(v, &["cover", "video_cover"]),
                        duration: first_u64(v, &["duration"]).unwrap_or(0),
                        index: i + 1,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let pick = |key: &str| {
            non_empty(first_string(video, &[key])).unwrap_or_else(|| first_string(data, &[key]))
        };

        Self {
            id: id.to_string(),
            title: non_empty(pick("series_title")).unwrap_or_else(|| "Drama".to_string()),
            description: pick("series_intro"),
            cover: pick("series_cover"),
            total_episodes: first_u64(video, &["episode_cnt"])
                .or_else(|| first_u64(data, &["episode_cnt"]))
                .unwrap_or(episodes.len() as u64),
            status: status_label(video.get("series_status").and_then(Value::as_u64) == Some(1)),
            age_gate: video
                .pointer("/age_gate_info/age_gate")
                .and_then(as_u64_lenient)
                .unwrap_or(0),
            categories: parse_categories(video.get("category_schema")),
            episodes,
        }
    }
}

fn status_label(ongoing: bool) -> &'static str {
    if ongoing {
        "ongoing"
    } else {
        "completed"
    }
}

/// Category lists arrive as a JSON-encoded string or as an array.
pub fn parse_categories(raw: Option<&Value>) -> Vec<Category> {
    let parsed;
    let list = match raw {
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(_) => return Vec::new(),
        },
        Some(v) => v,
        None => return Vec::new(),
    };

    list.as_array()
        .map(|cats| {
            cats.iter()
                .map(|cat| Category {
                    id: first_string(cat, &["ObjectId"]),
                    name: first_string(cat, &["Name"]),
                    kind: non_empty(first_string(cat, &["dim_name"]))
                        .unwrap_or_else(|| "genre".to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn first_string(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| match item.get(*k)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .next()
        .unwrap_or_default()
}

// Zero is skipped like an absent value
fn first_u64(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(as_u64_lenient))
        .find(|n| *n != 0)
}

fn as_u64_lenient(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
