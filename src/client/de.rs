//! Lenient deserializers for numeric API fields
//!
//! The events API is not consistent about numeric types: depending on the
//! field and the backing store, statuses and timings arrive as JSON numbers
//! or as strings ("200", "0.000"). Missing upstream values show up as null
//! or as "-".

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw<T> {
    Num(T),
    Str(String),
}

pub fn num_or_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Raw::<T>::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

pub fn opt_num_or_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                return Ok(None);
            }
            s.parse().map(Some).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::num_or_str")]
        status: u16,
        #[serde(default, deserialize_with = "super::opt_num_or_str")]
        upstream: Option<u16>,
    }

    #[test]
    fn parses_number() {
        let p: Probe = serde_json::from_str(r#"{"status": 200}"#).unwrap();
        assert_eq!(p.status, 200);
    }

    #[test]
    fn parses_string() {
        let p: Probe = serde_json::from_str(r#"{"status": "404"}"#).unwrap();
        assert_eq!(p.status, 404);
    }

    #[test]
    fn dash_means_absent() {
        let p: Probe = serde_json::from_str(r#"{"status": 200, "upstream": "-"}"#).unwrap();
        assert_eq!(p.upstream, None);
    }

    #[test]
    fn null_means_absent() {
        let p: Probe = serde_json::from_str(r#"{"status": 200, "upstream": null}"#).unwrap();
        assert_eq!(p.upstream, None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(serde_json::from_str::<Probe>(r#"{"status": "abc"}"#).is_err());
    }
}
