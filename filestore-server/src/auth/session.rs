use filestore_service::context::{IdentityFacts, TeamMembership};
use jsonwebtoken::{Algorithm, Header, TokenData, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::auth::key_directory::PublicKeyDirectory;

/// The audience session tokens must be issued for, if they name one.
pub const SESSION_AUDIENCE: &str = "filestore";

/// A team membership as carried in a session token.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TeamClaim {
    /// The team ID.
    pub team: String,
    /// The ID of the membership record.
    pub membership: String,
    /// Roles held inside the team.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The verified claims of a session token.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// The ID of the user the session belongs to.
    pub sub: String,
    /// The user's team memberships.
    #[serde(default)]
    pub teams: Vec<TeamClaim>,
}

impl From<SessionClaims> for IdentityFacts {
    fn from(claims: SessionClaims) -> Self {
        let memberships = claims
            .teams
            .into_iter()
            .map(|team| TeamMembership {
                team_id: team.team,
                membership_id: team.membership,
                roles: team.roles,
            })
            .collect();

        IdentityFacts {
            user_id: Some(claims.sub),
            memberships,
            ..Default::default()
        }
    }
}

fn jwt_validation_params(jwt_header: &Header) -> Validation {
    let mut validation = Validation::new(jwt_header.alg);
    validation.set_audience(&[SESSION_AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

impl SessionClaims {
    /// Decodes and verifies a session token.
    ///
    /// Session tokens _must_ contain:
    /// - the `kid` header indicating which key was used to sign the token
    /// - the `exp` claim indicating when the token expires
    /// - the `sub` claim naming the user
    ///
    /// The `aud` claim is not required, but if set it must be `"filestore"`.
    ///
    /// To verify the token, filestore looks up a list of possible keys based on the `kid` header
    /// field and attempts verification with each of them.
    pub fn from_encoded_jwt(
        encoded_token: &str,
        key_directory: &PublicKeyDirectory,
    ) -> Result<Self, AuthError> {
        let jwt_header = decode_header(encoded_token)?;
        let key_id = jwt_header
            .kid
            .as_ref()
            .ok_or(AuthError::BadRequest("JWT header is missing `kid` field"))?;

        let key_config = key_directory
            .keys
            .get(key_id)
            .ok_or_else(|| AuthError::UnknownKey(key_id.clone()))?;

        if jwt_header.alg != Algorithm::EdDSA {
            tracing::warn!(
                algorithm = ?jwt_header.alg,
                "JWT signed with unexpected algorithm",
            );
            let kind = jsonwebtoken::errors::ErrorKind::InvalidAlgorithm;
            return Err(AuthError::ValidationFailure(kind.into()));
        }

        let mut verified_claims: Option<TokenData<SessionClaims>> = None;
        for decoding_key in &key_config.key_versions {
            let decode_result = decode::<SessionClaims>(
                encoded_token,
                decoding_key,
                &jwt_validation_params(&jwt_header),
            );

            // Handle retryable errors
            use jsonwebtoken::errors::ErrorKind;
            if decode_result
                .as_ref()
                .is_err_and(|err| err.kind() == &ErrorKind::InvalidSignature)
            {
                continue;
            }

            verified_claims = Some(decode_result?);
            break;
        }

        let verified_claims = verified_claims.ok_or(AuthError::VerificationFailure)?;
        Ok(verified_claims.claims)
    }
}
