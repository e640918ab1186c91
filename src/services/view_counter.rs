use std::sync::Arc;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::warn;

use crate::counter::CounterStore;

pub const KEY_PREFIX: &str = "view:";
pub const COOKIE_PREFIX: &str = "v_";
pub const SEEN: &str = "1";
pub const DEDUP_WINDOW_DAYS: i64 = 7;
const MAX_COOKIE_SLUG_LEN: usize = 64;

/// Cookie marking that this browser was already counted for `slug`.
pub fn cookie_name(slug: &str) -> String {
    let safe: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_COOKIE_SLUG_LEN)
        .collect();
    format!("{}{}", COOKIE_PREFIX, safe)
}

pub fn counter_key(slug: &str) -> String {
    format!("{}{}", KEY_PREFIX, slug)
}

/// Per-page view counting, at most once per browser per window.
#[derive(Clone)]
pub struct ViewCounter {
    store: Option<Arc<dyn CounterStore>>,
    secure_cookies: bool,
}

impl ViewCounter {
    pub fn new(store: Option<Arc<dyn CounterStore>>, secure_cookies: bool) -> Self {
        Self { store, secure_cookies }
    }

    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the page's view count, counting this visit if the browser has not
    /// been seen yet. Never fails: any store error reads as zero.
    ///
    /// The cookie check and the increment are separate round trips, so two first
    /// visits racing each other are both counted.
    pub async fn get_and_increment(&self, slug: &str, jar: CookieJar) -> (CookieJar, u64) {
        let Some(store) = &self.store else {
            return (jar, 0);
        };

        let key = counter_key(slug);
        let name = cookie_name(slug);
        let seen = jar.get(&name).is_some_and(|c| c.value() == SEEN);

        if seen {
            return match store.get(&key).await {
                Ok(count) => (jar, to_count(count.unwrap_or(0))),
                Err(e) => {
                    warn!("reading view count for {} failed: {}", slug, e);
                    (jar, 0)
                }
            };
        }

        match store.increment(&key).await {
            Ok(count) => {
                let jar = jar.add(self.seen_cookie(name));
                (jar, to_count(count))
            }
            Err(e) => {
                warn!("incrementing view count for {} failed: {}", slug, e);
                (jar, 0)
            }
        }
    }

    fn seen_cookie(&self, name: String) -> Cookie<'static> {
        Cookie::build((name, SEEN))
            .path("/")
            .max_age(time::Duration::days(DEDUP_WINDOW_DAYS))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure_cookies)
            .build()
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_names_are_sanitised_and_bounded() {
        assert_eq!(cookie_name("daily"), "v_daily");
        assert_eq!(cookie_name("posts/hello world!"), "v_posts_hello_world_");
        assert_eq!(cookie_name("a-b_c"), "v_a-b_c");

        let long = "x".repeat(100);
        assert_eq!(cookie_name(&long).len(), COOKIE_PREFIX.len() + 64);
    }

    #[test]
    fn counter_keys_are_namespaced() {
        assert_eq!(counter_key("daily"), "view:daily");
    }
}
