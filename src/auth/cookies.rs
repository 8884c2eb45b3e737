/// Session Cookie Mapping
///
/// Pure translation between a token pair and the `access` / `refresh` cookies.
/// No I/O happens here; callers attach the cookies to a response.

use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::{Cookie, CookieBuilder, SameSite};
use actix_web::{HttpResponse, HttpResponseBuilder};

use crate::auth::tokens::{IssuedToken, TokenPair};
use crate::configuration::CookieSettings;

pub const ACCESS_COOKIE: &str = "access";
pub const REFRESH_COOKIE: &str = "refresh";

/// The two session cookies, always set or cleared together
#[derive(Debug, Clone)]
pub struct CookiePair {
    pub access: Cookie<'static>,
    pub refresh: Cookie<'static>,
}

impl CookiePair {
    /// Attach both cookies to a response under construction
    pub fn apply<'a>(&self, builder: &'a mut HttpResponseBuilder) -> &'a mut HttpResponseBuilder {
        builder.cookie(self.access.clone()).cookie(self.refresh.clone())
    }

    /// Attach both cookies to an already built response
    pub fn write_to<B>(&self, response: &mut HttpResponse<B>) {
        for cookie in [&self.access, &self.refresh] {
            if let Err(e) = response.add_cookie(cookie) {
                tracing::error!(cookie = cookie.name(), "Failed to set session cookie: {}", e);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionCookies {
    same_site: SameSite,
    secure: bool,
    safety_margin_seconds: i64,
}

impl SessionCookies {
    pub fn new(settings: &CookieSettings) -> Self {
        Self {
            same_site: settings.same_site.into(),
            secure: settings.secure,
            safety_margin_seconds: settings.safety_margin_seconds,
        }
    }

    /// Cookies for a token pair
    ///
    /// Each cookie expires `safety_margin` before its own token, so a browser
    /// never presents a cookie whose token the server would already refuse.
    pub fn to_cookies(&self, pair: &TokenPair) -> CookiePair {
        CookiePair {
            access: self.session_cookie(ACCESS_COOKIE, &pair.access),
            refresh: self.session_cookie(REFRESH_COOKIE, &pair.refresh),
        }
    }

    /// Removal cookies for logout and rejected sessions
    pub fn clear(&self) -> CookiePair {
        CookiePair {
            access: self.removal_cookie(ACCESS_COOKIE),
            refresh: self.removal_cookie(REFRESH_COOKIE),
        }
    }

    fn session_cookie(&self, name: &'static str, issued: &IssuedToken) -> Cookie<'static> {
        let expires_at = issued.expires_at() - self.safety_margin_seconds;
        let expires = OffsetDateTime::from_unix_timestamp(expires_at)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        self.base(name, issued.token.clone()).expires(expires).finish()
    }

    fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.base(name, String::new()).finish();
        cookie.make_removal();
        cookie
    }

    fn base(&self, name: &'static str, value: String) -> CookieBuilder<'static> {
        Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .same_site(self.same_site)
            .secure(self.secure)
    }
}
