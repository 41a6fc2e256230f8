//! Session tokens
//!
//! A session token is an HS256 JWT carrying the principal's roles and the
//! permission keys materialized from the matrix at issue time. Requests are
//! authorized from these claims alone; `POST /auth/refresh` re-materializes.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeSet;

use crate::prelude::*;
use taskmart_types::rbac::{resolve_permissions, AccountMode, Principal, Role};

/// Default session lifetime in seconds
pub const TOKEN_EXPIRY: i64 = 8 * 3600;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
	pub sub: UserId,
	pub roles: Vec<Role>,
	pub permissions: Vec<Box<str>>,
	pub mode: Option<AccountMode>,
	/// Second factor verified for this session
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub tfa: bool,
	pub exp: Timestamp,
}

impl SessionClaims {
	pub fn principal(&self) -> Principal {
		Principal {
			user_id: self.sub,
			roles: self.roles.iter().map(|role| role.key.clone()).collect(),
			permissions: self.permissions.iter().cloned().collect(),
			mode: self.mode,
			two_factor_verified: self.tfa,
		}
	}
}

pub struct TokenKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
}

impl TokenKeys {
	pub fn from_secret(secret: &[u8]) -> ClResult<Self> {
		if secret.len() < 16 {
			return Err(Error::ConfigError("JWT secret must be at least 16 bytes".into()));
		}
		Ok(Self { encoding: EncodingKey::from_secret(secret), decoding: DecodingKey::from_secret(secret) })
	}
}

impl std::fmt::Debug for TokenKeys {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("TokenKeys(..)")
	}
}

pub fn issue_token(keys: &TokenKeys, claims: &SessionClaims) -> ClResult<Box<str>> {
	let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)?;
	Ok(token.into())
}

/// Verify signature and expiry and build the request principal
pub fn validate_token(keys: &TokenKeys, token: &str) -> ClResult<Principal> {
	let validation = Validation::new(Algorithm::HS256);
	let data = jsonwebtoken::decode::<SessionClaims>(token, &keys.decoding, &validation)?;
	Ok(data.claims.principal())
}

/// Session issued to a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	pub token: Box<str>,
	pub user_id: UserId,
	pub roles: Vec<Role>,
	pub permissions: BTreeSet<Box<str>>,
	pub mode: Option<AccountMode>,
	pub expires_at: Timestamp,
}

/// Resolve a user's roles and effective permissions under `mode`
pub async fn materialize_principal(
	app: &App,
	user_id: UserId,
	mode: Option<AccountMode>,
	two_factor_verified: bool,
) -> ClResult<(Principal, Vec<Role>)> {
	let roles = app.policy_adapter.list_user_roles(user_id).await?;

	let mut permissions = BTreeSet::new();
	for role in &roles {
		let rows = app.permission_cache.get(role.id).await?;
		permissions.extend(resolve_permissions(rows.iter(), mode));
	}

	let principal = Principal {
		user_id,
		roles: roles.iter().map(|role| role.key.clone()).collect(),
		permissions,
		mode,
		two_factor_verified,
	};
	Ok((principal, roles))
}

/// Materialize permissions and sign a new session token
pub async fn create_session(
	app: &App,
	user_id: UserId,
	mode: Option<AccountMode>,
	two_factor_verified: bool,
) -> ClResult<Session> {
	let (principal, roles) = materialize_principal(app, user_id, mode, two_factor_verified).await?;
	let expires_at = Timestamp::now().add_seconds(app.opts.token_expiry);

	let claims = SessionClaims {
		sub: user_id,
		roles: roles.clone(),
		permissions: principal.permissions.iter().cloned().collect(),
		mode,
		tfa: two_factor_verified,
		exp: expires_at,
	};
	let token = issue_token(&app.token_keys, &claims)?;
	debug!(
		subject = %user_id,
		permissions = principal.permissions.len(),
		"Session token issued"
	);

	Ok(Session { token, user_id, roles, permissions: principal.permissions, mode, expires_at })
}


// vim: ts=4
