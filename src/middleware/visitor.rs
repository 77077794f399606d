use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;
use uuid::Uuid;

pub const VISITOR_COOKIE: &str = "visitor_id";

const COOKIE_MAX_AGE_DAYS: i64 = 30;

// O Set-Cookie de um token de visitante: HTTP-only, 30 dias, Secure só
// em produção para o desenvolvimento local em HTTP puro funcionar.
pub fn visitor_cookie(visitor_id: Uuid, production: bool) -> Cookie<'static> {
    Cookie::build((VISITOR_COOKIE, visitor_id.to_string()))
        .http_only(true)
        .secure(production)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
        .build()
}

pub fn clear_visitor_cookie() -> Cookie<'static> {
    Cookie::build((VISITOR_COOKIE, "")).path("/").build()
}

// Extrator do token de visitante persistido no cookie. Cookie ausente ou
// malformado não é erro; cada handler decide o que uma requisição
// anônima significa para ele.
pub struct MaybeVisitor(pub Option<Uuid>);

impl<S> FromRequestParts<S> for MaybeVisitor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        let visitor_id =
            jar.get(VISITOR_COOKIE).and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
        Ok(MaybeVisitor(visitor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_attributes() {
        let id = Uuid::new_v4();
        let cookie = visitor_cookie(id, false);
        assert_eq!(cookie.name(), "visitor_id");
        assert_eq!(cookie.value(), id.to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));

        let secure = visitor_cookie(id, true);
        assert_eq!(secure.secure(), Some(true));
    }
}
