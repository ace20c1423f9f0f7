use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

const ADMIN_COOKIE: &str = "salon_admin_ok";

// A plaintext door code: the admin panel sits behind a shared secret and a
// session-scoped cookie flag. There is no server boundary to protect, so no
// hashing, lockout, or expiry.
pub fn verify_password(expected: &str, input: &str) -> bool {
    input == expected
}

pub fn is_authorized(req: &HttpRequest) -> bool {
    req.cookie(ADMIN_COOKIE)
        .map(|cookie| cookie.value() == "1")
        .unwrap_or(false)
}

pub fn grant_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(ADMIN_COOKIE, "1")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn revoke_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(ADMIN_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn password_is_compared_verbatim() {
        assert!(verify_password("admin123", "admin123"));
        assert!(!verify_password("admin123", "admin123 "));
        assert!(!verify_password("admin123", ""));
    }

    #[test]
    fn authorization_follows_the_cookie_flag() {
        let req = TestRequest::default().to_http_request();
        assert!(!is_authorized(&req));

        let req = TestRequest::default()
            .cookie(Cookie::new(ADMIN_COOKIE, "1"))
            .to_http_request();
        assert!(is_authorized(&req));

        let req = TestRequest::default()
            .cookie(Cookie::new(ADMIN_COOKIE, "0"))
            .to_http_request();
        assert!(!is_authorized(&req));
    }
}
