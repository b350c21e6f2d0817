//! Actor extraction from gateway-propagated headers.

use crate::error::{ComplaintError, Result};
use crate::models::{Actor, Administration, Governorate, Role};
use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use std::str::FromStr;
use uuid::Uuid;

pub const ACTOR_ID: &str = "x-actor-id";
pub const ACTOR_EMAIL: &str = "x-actor-email";
pub const ACTOR_ROLE: &str = "x-actor-role";
pub const ACTOR_ADMINISTRATION: &str = "x-actor-administration";
pub const ACTOR_GOVERNORATE: &str = "x-actor-governorate";

/// Header value as UTF-8; scope labels are Arabic so `to_str` is not enough.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => std::str::from_utf8(value.as_bytes())
            .map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
            .map_err(|_| ComplaintError::InvalidInput(format!("{} is not valid UTF-8", name))),
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw.to_ascii_lowercase().as_str() {
        "admin" => Ok(Role::Moderator),
        other => Ok(Role::from_str(other)?),
    }
}

/// Absent role means citizen. Scope attributes are passed through as given;
/// missing ones make the visibility rules fail closed.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor> {
    let id = header(headers, ACTOR_ID)?
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| ComplaintError::InvalidInput(format!("{} is not a UUID", ACTOR_ID)))
        })
        .transpose()?;

    let role = header(headers, ACTOR_ROLE)?
        .map(parse_role)
        .transpose()?
        .unwrap_or(Role::Citizen);

    let administration = header(headers, ACTOR_ADMINISTRATION)?
        .map(Administration::from_str)
        .transpose()?;
    let governorate = header(headers, ACTOR_GOVERNORATE)?
        .map(Governorate::from_str)
        .transpose()?;

    Ok(Actor {
        id,
        email: header(headers, ACTOR_EMAIL)?.map(str::to_string),
        role,
        administration,
        governorate,
    })
}

impl FromRequest for Actor {
    type Error = ComplaintError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_from_headers(req.headers()))
    }
}
